//! Identity-preserving conversion of object graphs to tagged JSON and back.
//!
//! [`flatten`] turns a live [`Value`] graph into a JSON-safe tree whose
//! reserved keys (see [`tags`]) record tuples, sets, instance types, type
//! references, captured state and back-references. [`restore`] rebuilds the
//! graph, with shared references still shared and cycles still closed.
//! [`encode`] and [`decode`] add the text step through the active backend.
//!
//! ```
//! use typedjson::{EncodeOptions, Value};
//!
//! let shared = Value::list([1, 2]);
//! let graph = Value::tuple([shared.clone(), shared]);
//!
//! let text = typedjson::encode(&graph).unwrap();
//! assert_eq!(text, r#"{"tj/tuple":[[1,2],{"tj/id":1}]}"#);
//!
//! let restored = typedjson::decode(&text).unwrap();
//! let tuple = restored.as_tuple().unwrap();
//! assert!(tuple.get(0).unwrap().ptr_eq(&tuple.get(1).unwrap()));
//!
//! let plain = typedjson::encode_with(&graph, EncodeOptions::new().with_unpicklable(false));
//! assert_eq!(plain.unwrap(), "[[1,2],[1,2]]");
//! ```
//!
//! Types take part by implementing [`Reflect`] and being registered with
//! [`register_type`]; types that cannot expose their attributes register a
//! [`Handler`] instead.

mod config;
mod error;
mod pickler;
mod reflect;
mod unpickler;

pub mod handlers;
pub mod registry;
pub mod repr;
pub mod tags;
pub mod value;

pub use config::{EncodeOptions, TypedJson};
pub use error::{Error, Result};
pub use handlers::{Handler, HandlerRegistry, ReprHandler};
pub use pickler::Pickler;
pub use reflect::{Attributes, Container, Reflect, ReprError, TypePath};
pub use registry::{TypeRegistration, TypeRegistry};
pub use unpickler::Unpickler;
pub use value::{Dict, List, ObjectRef, Set, Tuple, TypeRef, Value};

pub use typedjson_backend::{BackendError, BackendRegistry, CodecFailure, CodecModule};

/// The JSON-safe tree produced by flattening.
pub type FlatValue = serde_json::Value;

pub fn encode(value: &Value) -> Result<String> {
    TypedJson::global().encode(value)
}

pub fn encode_with(value: &Value, options: EncodeOptions) -> Result<String> {
    TypedJson::global().encode_with(value, options)
}

pub fn decode(text: &str) -> Result<Value> {
    TypedJson::global().decode(text)
}

pub fn flatten(value: &Value) -> FlatValue {
    TypedJson::global().flatten(value)
}

pub fn flatten_with(value: &Value, options: EncodeOptions) -> FlatValue {
    TypedJson::global().flatten_with(value, options)
}

pub fn restore(flat: &FlatValue) -> Result<Value> {
    TypedJson::global().restore(flat)
}

/// See [`BackendRegistry::load_backend`]. Returns whether the backend was installed.
pub fn load_backend(name: &str, encode: &str, decode: &str, decode_error: &str) -> bool {
    TypedJson::global().load_backend(name, encode, decode, decode_error)
}

pub fn set_preferred_backend(name: &str) -> Result<()> {
    TypedJson::global().set_preferred_backend(name)
}

pub fn remove_backend(name: &str) {
    TypedJson::global().remove_backend(name)
}

pub fn register_handler(path: impl Into<String>, handler: impl Handler + 'static) {
    TypedJson::global().register_handler(path, handler)
}

pub fn register_type<T: Reflect + TypePath + Default>() {
    TypedJson::global().register_type::<T>()
}
