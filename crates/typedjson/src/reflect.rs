//! The capability contract a type implements to be flattened and restored
//! without an explicit handler.
//!
//! Restoring an instance is always construct-then-populate: the registered
//! constructor builds a default instance, the engine records it, and only
//! then are attributes, container items or captured state applied. That order
//! is what lets an instance's own fields point back at it.
//!
//! ```
//! use std::any::Any;
//! use typedjson::{Reflect, TypePath, Value};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl TypePath for Point {
//!     fn type_path() -> &'static str {
//!         "geometry.Point"
//!     }
//! }
//!
//! impl Reflect for Point {
//!     fn reflect_type_path(&self) -> &'static str {
//!         Self::type_path()
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//!     fn attributes(&self) -> Vec<(String, Value)> {
//!         vec![("x".into(), self.x.into()), ("y".into(), self.y.into())]
//!     }
//!     fn set_attribute(&mut self, name: &str, value: Value) {
//!         match name {
//!             "x" => self.x = value.as_i64().unwrap_or_default(),
//!             "y" => self.y = value.as_i64().unwrap_or_default(),
//!             _ => {}
//!         }
//!     }
//! }
//! ```

use std::any::Any;

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{Dict, List, Set, Value};

/// Static dotted path of a type, e.g. `"samples.Thing"`.
pub trait TypePath {
    fn type_path() -> &'static str;
}

/// A textual representation could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot represent `{type_path}`: {message}")]
pub struct ReprError {
    pub type_path: String,
    pub message: String,
}

impl ReprError {
    pub fn new(type_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_path: type_path.into(),
            message: message.into(),
        }
    }
}

/// Container data owned by a container subtype.
///
/// The handle is the instance's own storage: flattening reads it, restoring
/// fills it after default construction.
#[derive(Debug, Clone)]
pub enum Container {
    Sequence(List),
    Set(Set),
    /// Entries are flattened into the instance mapping itself, so mapping
    /// subtypes carry no extra attributes.
    Mapping(Dict),
}

impl From<Container> for Value {
    fn from(container: Container) -> Self {
        match container {
            Container::Sequence(list) => Value::List(list),
            Container::Set(set) => Value::Set(set),
            Container::Mapping(dict) => Value::Dict(dict),
        }
    }
}

pub trait Reflect: Any {
    fn reflect_type_path(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Settable attributes, in declaration order. For container subtypes this
    /// excludes the container data itself.
    fn attributes(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Unknown names are ignored.
    fn set_attribute(&mut self, name: &str, value: Value) {
        let _ = (name, value);
    }

    fn container(&self) -> Option<Container> {
        None
    }

    /// State-capture hook. When it returns `Some`, the state replaces the
    /// attributes in the flattened form and is handed to
    /// [`set_state`](Self::set_state) on restore.
    fn state(&self) -> Option<Value> {
        None
    }

    fn set_state(&mut self, state: Value) {
        let _ = state;
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("<{} object>", self.reflect_type_path()))
    }
}

/// Insertion-ordered attributes for types that accept arbitrary names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(IndexMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<(String, Value)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
