//! Backend registry error type.

use thiserror::Error;

use crate::codecs::CodecFailure;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// One or more symbols named at registration could not be resolved.
    #[error("cannot load backend `{name}`: unresolved {}", .missing.join(", "))]
    Registration { name: String, missing: Vec<String> },
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),
    #[error("backend `{backend}` failed to encode: {source}")]
    Encode {
        backend: String,
        #[source]
        source: CodecFailure,
    },
    #[error("backend `{backend}` failed to decode: {source}")]
    Decode {
        backend: String,
        #[source]
        source: CodecFailure,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_message_lists_missing_symbols() {
        let err = BackendError::Registration {
            name: "serde_json".into(),
            missing: vec!["encode `bad!`".into(), "error kind `nope`".into()],
        };
        assert_eq!(
            err.to_string(),
            "cannot load backend `serde_json`: unresolved encode `bad!`, error kind `nope`"
        );
    }
}
