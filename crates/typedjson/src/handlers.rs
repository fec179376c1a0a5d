//! Per-type flatten/restore overrides.
//!
//! A handler owns the whole flattened shape of its type. The engine has
//! already assigned the instance a memo slot when the handler runs, so a
//! handler that flattens children through the [`Pickler`] and restores them
//! through the [`Unpickler`] in the same order keeps references intact.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Map;

use crate::error::{Error, Result};
use crate::pickler::Pickler;
use crate::reflect::{Container, Reflect, TypePath};
use crate::repr::repr_or_fallback;
use crate::tags;
use crate::unpickler::Unpickler;
use crate::value::{ObjectRef, Value};
use crate::FlatValue;

pub trait Handler: Send + Sync {
    /// `data` already carries the object tag unless the pickler is lossy.
    fn flatten(&self, obj: &ObjectRef, data: Map<String, FlatValue>, pickler: &mut Pickler)
        -> FlatValue;

    /// `data` is the whole tagged mapping, object tag included.
    fn restore(&self, data: &Map<String, FlatValue>, unpickler: &mut Unpickler) -> Result<Value>;
}

/// Shared type-path→handler table. Clones are handles to the same table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Handler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn Handler>>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn Handler>>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Installs `handler` for `path`, replacing any earlier registration.
    pub fn register(&self, path: impl Into<String>, handler: impl Handler + 'static) {
        self.register_arc(path, Arc::new(handler));
    }

    pub fn register_arc(&self, path: impl Into<String>, handler: Arc<dyn Handler>) {
        let path = path.into();
        log::debug!("registered handler for `{path}`");
        self.write().insert(path, handler);
    }

    pub fn register_for<T: TypePath>(&self, handler: impl Handler + 'static) {
        self.register(T::type_path(), handler);
    }

    pub fn unregister(&self, path: &str) -> bool {
        self.write().remove(path).is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(path)
    }

    /// Exact path match. The lock is released before the handler is used.
    pub fn lookup(&self, path: &str) -> Option<Arc<dyn Handler>> {
        self.read().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}

/// How an object instance is flattened, in priority order.
pub(crate) enum Strategy {
    Handler(Arc<dyn Handler>),
    State(Value),
    Container(Container),
    Generic,
}

impl Strategy {
    pub(crate) fn of(handlers: &HandlerRegistry, obj: &ObjectRef) -> Self {
        if let Some(handler) = handlers.lookup(obj.type_path()) {
            return Strategy::Handler(handler);
        }
        let obj = obj.borrow();
        if let Some(state) = obj.state() {
            return Strategy::State(state);
        }
        match obj.container() {
            Some(container) => Strategy::Container(container),
            None => Strategy::Generic,
        }
    }
}

/// Flattens `T` to its [`Display`](fmt::Display) text and restores it with
/// [`FromStr`].
///
/// Tagged output is `{"tj/object": path, "tj/repr": text}`; lossy output is
/// the bare text.
pub struct ReprHandler<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ReprHandler<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ReprHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Handler for ReprHandler<T>
where
    T: Reflect + TypePath + fmt::Display + FromStr,
    T::Err: fmt::Display,
{
    fn flatten(
        &self,
        obj: &ObjectRef,
        mut data: Map<String, FlatValue>,
        pickler: &mut Pickler,
    ) -> FlatValue {
        let text = match obj.downcast_ref::<T>() {
            Some(inner) => inner.to_string(),
            None => repr_or_fallback(&Value::Object(obj.clone())),
        };
        if !pickler.unpicklable() {
            return FlatValue::String(text);
        }
        data.insert(tags::REPR.to_owned(), FlatValue::String(text));
        FlatValue::Object(data)
    }

    fn restore(&self, data: &Map<String, FlatValue>, _unpickler: &mut Unpickler) -> Result<Value> {
        let text = data
            .get(tags::REPR)
            .and_then(FlatValue::as_str)
            .ok_or_else(|| Error::malformed(tags::REPR, "expected a string"))?;
        text.parse::<T>()
            .map(Value::object)
            .map_err(|err| Error::Handler {
                path: T::type_path().to_owned(),
                message: err.to_string(),
            })
    }
}
