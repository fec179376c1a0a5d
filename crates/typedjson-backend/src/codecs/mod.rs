//! Backend codecs: symbol tables, the built-in serde_json module and the
//! named backend registry.

mod json;
mod registry;
mod types;

pub use json::{serde_json_module, DEFAULT_BACKEND};
pub use registry::BackendRegistry;
pub use types::{Backend, CodecFailure, CodecModule, DecodeFn, EncodeFn};
