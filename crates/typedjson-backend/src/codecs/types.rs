//! Codec function types, module symbol tables and resolved backends.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Encodes a flattened tree into text.
pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<String, CodecFailure> + Send + Sync>;
/// Decodes text into a flattened tree.
pub type DecodeFn = Arc<dyn Fn(&str) -> Result<Value, CodecFailure> + Send + Sync>;

/// A failure raised by a codec function.
///
/// `kind` names the error type the codec raised; a backend only treats
/// failures of its registered decode-error kind as recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct CodecFailure {
    pub kind: String,
    pub message: String,
}

impl CodecFailure {
    pub fn new(kind: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            kind: kind.into(),
            message: message.to_string(),
        }
    }
}

/// The symbols a codec provider exports, looked up by name when a backend is
/// loaded.
#[derive(Clone, Default)]
pub struct CodecModule {
    name: String,
    encoders: HashMap<String, EncodeFn>,
    decoders: HashMap<String, DecodeFn>,
    error_kinds: HashSet<String>,
}

impl CodecModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_encoder<F>(mut self, symbol: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<String, CodecFailure> + Send + Sync + 'static,
    {
        self.encoders.insert(symbol.into(), Arc::new(f));
        self
    }

    pub fn with_decoder<F>(mut self, symbol: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> Result<Value, CodecFailure> + Send + Sync + 'static,
    {
        self.decoders.insert(symbol.into(), Arc::new(f));
        self
    }

    pub fn with_error_kind(mut self, symbol: impl Into<String>) -> Self {
        self.error_kinds.insert(symbol.into());
        self
    }

    pub fn encoder(&self, symbol: &str) -> Option<EncodeFn> {
        self.encoders.get(symbol).cloned()
    }

    pub fn decoder(&self, symbol: &str) -> Option<DecodeFn> {
        self.decoders.get(symbol).cloned()
    }

    pub fn has_error_kind(&self, symbol: &str) -> bool {
        self.error_kinds.contains(symbol)
    }
}

impl fmt::Debug for CodecModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut encoders: Vec<_> = self.encoders.keys().collect();
        let mut decoders: Vec<_> = self.decoders.keys().collect();
        encoders.sort();
        decoders.sort();
        f.debug_struct("CodecModule")
            .field("name", &self.name)
            .field("encoders", &encoders)
            .field("decoders", &decoders)
            .field("error_kinds", &self.error_kinds)
            .finish()
    }
}

/// A fully resolved backend: all three parts are always present.
#[derive(Clone)]
pub struct Backend {
    pub name: String,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
    pub decode_error: String,
}

impl Backend {
    pub fn new<E, D>(
        name: impl Into<String>,
        encode: E,
        decode: D,
        decode_error: impl Into<String>,
    ) -> Self
    where
        E: Fn(&Value) -> Result<String, CodecFailure> + Send + Sync + 'static,
        D: Fn(&str) -> Result<Value, CodecFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            encode: Arc::new(encode),
            decode: Arc::new(decode),
            decode_error: decode_error.into(),
        }
    }

    /// Whether `failure` is the error kind this backend declared for decoding.
    pub fn recognizes(&self, failure: &CodecFailure) -> bool {
        failure.kind == self.decode_error
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("decode_error", &self.decode_error)
            .finish_non_exhaustive()
    }
}
