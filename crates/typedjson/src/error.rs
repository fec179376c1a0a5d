//! Error type for encoding, decoding and restoring.
//!
//! Flattening never fails; every variant here comes from a backend or from
//! restoring a tree.

use thiserror::Error;
use typedjson_backend::BackendError;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("cannot resolve type `{0}`")]
    TypeResolution(String),
    #[error("type `{0}` is registered as a symbol and cannot be constructed")]
    NotConstructible(String),
    #[error("malformed `{tag}` node: {reason}")]
    MalformedTag { tag: &'static str, reason: String },
    #[error("reference to unknown object #{0}")]
    DanglingReference(usize),
    #[error("handler for `{path}` failed: {message}")]
    Handler { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(tag: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedTag {
            tag,
            reason: reason.into(),
        }
    }
}
