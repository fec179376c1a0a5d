//! Engine configuration: flatten options and the registries an encode or
//! decode call consults.

use std::sync::OnceLock;

use typedjson_backend::BackendRegistry;

use crate::error::Result;
use crate::handlers::{Handler, HandlerRegistry};
use crate::pickler::Pickler;
use crate::reflect::{Reflect, TypePath};
use crate::registry::TypeRegistry;
use crate::unpickler::Unpickler;
use crate::value::Value;
use crate::FlatValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit tags so the output restores to the original types. When false
    /// the output is plain JSON with no tags at all.
    pub unpicklable: bool,
    /// Values nested deeper than this are written as their textual
    /// representation.
    pub max_depth: Option<usize>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            unpicklable: true,
            max_depth: None,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unpicklable(mut self, unpicklable: bool) -> Self {
        self.unpicklable = unpicklable;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Registries bundled for encode and decode calls.
///
/// Each registry is a shared handle, so cloning a `TypedJson` yields a
/// configuration that sees the same registrations.
#[derive(Debug, Clone)]
pub struct TypedJson {
    types: TypeRegistry,
    handlers: HandlerRegistry,
    backends: BackendRegistry,
}

impl Default for TypedJson {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedJson {
    /// Builtin type symbols, no handlers, `serde_json` as the active backend.
    pub fn new() -> Self {
        Self::from_parts(TypeRegistry::new(), HandlerRegistry::new(), BackendRegistry::new())
    }

    pub fn from_parts(
        types: TypeRegistry,
        handlers: HandlerRegistry,
        backends: BackendRegistry,
    ) -> Self {
        Self {
            types,
            handlers,
            backends,
        }
    }

    /// The process-wide configuration behind the crate-level functions.
    pub fn global() -> &'static TypedJson {
        static GLOBAL: OnceLock<TypedJson> = OnceLock::new();
        GLOBAL.get_or_init(TypedJson::new)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub fn pickler(&self, options: EncodeOptions) -> Pickler {
        Pickler::new(self.handlers.clone(), options)
    }

    pub fn unpickler(&self) -> Unpickler {
        Unpickler::new(self.types.clone(), self.handlers.clone())
    }

    pub fn flatten(&self, value: &Value) -> FlatValue {
        self.flatten_with(value, EncodeOptions::default())
    }

    pub fn flatten_with(&self, value: &Value, options: EncodeOptions) -> FlatValue {
        self.pickler(options).flatten(value)
    }

    pub fn restore(&self, flat: &FlatValue) -> Result<Value> {
        self.unpickler().restore(flat)
    }

    pub fn encode(&self, value: &Value) -> Result<String> {
        self.encode_with(value, EncodeOptions::default())
    }

    pub fn encode_with(&self, value: &Value, options: EncodeOptions) -> Result<String> {
        let flat = self.flatten_with(value, options);
        Ok(self.backends.encode(&flat)?)
    }

    pub fn decode(&self, text: &str) -> Result<Value> {
        let flat = self.backends.decode(text)?;
        self.restore(&flat)
    }

    pub fn register_type<T: Reflect + TypePath + Default>(&self) {
        self.types.register::<T>();
    }

    pub fn register_handler(&self, path: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.register(path, handler);
    }

    pub fn register_handler_for<T: TypePath>(&self, handler: impl Handler + 'static) {
        self.handlers.register_for::<T>(handler);
    }

    pub fn load_backend(&self, name: &str, encode: &str, decode: &str, decode_error: &str) -> bool {
        self.backends.load_backend(name, encode, decode, decode_error)
    }

    pub fn set_preferred_backend(&self, name: &str) -> Result<()> {
        Ok(self.backends.set_preferred_backend(name)?)
    }

    pub fn remove_backend(&self, name: &str) {
        self.backends.remove_backend(name);
    }
}
