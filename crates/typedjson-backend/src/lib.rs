//! Pluggable text codecs ("backends") for typedjson.
//!
//! A backend turns a flattened [`serde_json::Value`] tree into text and back.
//! Codec providers publish their functions through a [`CodecModule`] symbol
//! table; [`BackendRegistry::load_backend`] resolves an encode function, a
//! decode function and a decode-error kind from a module and installs them
//! as one named [`Backend`], or installs nothing at all.
//!
//! ```
//! use typedjson_backend::BackendRegistry;
//! use serde_json::json;
//!
//! let registry = BackendRegistry::new();
//! let text = registry.encode(&json!({"a": [1, 2]})).unwrap();
//! assert_eq!(text, r#"{"a":[1,2]}"#);
//! assert_eq!(registry.decode(&text).unwrap(), json!({"a": [1, 2]}));
//! ```

pub mod codecs;
mod error;

pub use codecs::{
    serde_json_module, Backend, BackendRegistry, CodecFailure, CodecModule, DecodeFn, EncodeFn,
    DEFAULT_BACKEND,
};
pub use error::BackendError;
