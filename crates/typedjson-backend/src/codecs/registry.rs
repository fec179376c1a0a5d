//! Named backend registry with an ordered fallback list.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::json::{self, serde_json_module, DEFAULT_BACKEND};
use super::types::{Backend, CodecModule};
use crate::BackendError;

#[derive(Debug, Default)]
struct Inner {
    modules: HashMap<String, CodecModule>,
    backends: HashMap<String, Backend>,
    /// Head is the active backend; the rest are decode fallbacks.
    order: Vec<String>,
}

/// Process-shareable table of text backends.
///
/// Cloning yields another handle to the same table. All mutations happen
/// under one write lock, so a lookup never sees a half-installed backend.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl BackendRegistry {
    /// A registry with the `serde_json` module registered and loaded as the
    /// active backend.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_module(serde_json_module());
        registry.load_backend(DEFAULT_BACKEND, "to_string", "from_str", "Error");
        registry
    }

    /// A registry without modules or backends. Encoding and decoding fall back
    /// to the built-in compact serde_json codec.
    pub fn empty() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes a module's symbols available to [`load_backend`](Self::load_backend).
    /// A module with the same name is replaced.
    pub fn register_module(&self, module: CodecModule) {
        log::debug!("registered codec module `{}`", module.name());
        self.write().modules.insert(module.name().to_owned(), module);
    }

    /// Resolves `encode`, `decode` and `decode_error` in module `name` and
    /// installs them as backend `name`.
    ///
    /// A failed resolution is not raised: it is logged, the registry is left
    /// untouched and `false` is returned.
    pub fn load_backend(&self, name: &str, encode: &str, decode: &str, decode_error: &str) -> bool {
        match self.try_load_backend(name, encode, decode, decode_error) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Like [`load_backend`](Self::load_backend), reporting why resolution failed.
    pub fn try_load_backend(
        &self,
        name: &str,
        encode: &str,
        decode: &str,
        decode_error: &str,
    ) -> Result<(), BackendError> {
        let mut inner = self.write();
        let backend = {
            let module = inner.modules.get(name);
            let encode_fn = module.and_then(|m| m.encoder(encode));
            let decode_fn = module.and_then(|m| m.decoder(decode));
            let has_error = module.is_some_and(|m| m.has_error_kind(decode_error));

            let mut missing = Vec::new();
            if module.is_none() {
                missing.push(format!("module `{name}`"));
            }
            if encode_fn.is_none() {
                missing.push(format!("encode `{encode}`"));
            }
            if decode_fn.is_none() {
                missing.push(format!("decode `{decode}`"));
            }
            if !has_error {
                missing.push(format!("error kind `{decode_error}`"));
            }
            match (encode_fn, decode_fn) {
                (Some(encode), Some(decode)) if missing.is_empty() => Backend {
                    name: name.to_owned(),
                    encode,
                    decode,
                    decode_error: decode_error.to_owned(),
                },
                _ => {
                    return Err(BackendError::Registration {
                        name: name.to_owned(),
                        missing,
                    })
                }
            }
        };
        install(&mut inner, backend);
        log::debug!("loaded backend `{name}` ({encode}/{decode}/{decode_error})");
        Ok(())
    }

    /// Installs an already resolved backend under its own name.
    pub fn insert(&self, backend: Backend) {
        log::debug!("inserted backend `{}`", backend.name);
        install(&mut self.write(), backend);
    }

    /// Makes `name` the active backend.
    pub fn set_preferred_backend(&self, name: &str) -> Result<(), BackendError> {
        let mut inner = self.write();
        if !inner.backends.contains_key(name) {
            return Err(BackendError::UnknownBackend(name.to_owned()));
        }
        inner.order.retain(|n| n != name);
        inner.order.insert(0, name.to_owned());
        log::debug!("preferred backend is now `{name}`");
        Ok(())
    }

    /// Unregisters `name`; the next backend in order becomes active. No-op
    /// when absent.
    pub fn remove_backend(&self, name: &str) {
        let mut inner = self.write();
        if inner.backends.remove(name).is_some() {
            inner.order.retain(|n| n != name);
            log::debug!("removed backend `{name}`");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().backends.contains_key(name)
    }

    /// Name of the active backend, `None` when the built-in codec is in use.
    pub fn active_backend(&self) -> Option<String> {
        self.read().order.first().cloned()
    }

    /// Loaded backends, active first.
    pub fn backend_names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    fn snapshot(&self) -> Vec<Backend> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.backends.get(name).cloned())
            .collect()
    }

    /// Encodes with the active backend.
    pub fn encode(&self, value: &Value) -> Result<String, BackendError> {
        let active = self.snapshot().into_iter().next();
        match active {
            Some(backend) => (backend.encode)(value).map_err(|source| BackendError::Encode {
                backend: backend.name,
                source,
            }),
            None => json::to_string(value).map_err(|source| BackendError::Encode {
                backend: DEFAULT_BACKEND.to_owned(),
                source,
            }),
        }
    }

    /// Decodes with the active backend, moving on to the next backend when a
    /// failure is of the kind the backend declared.
    pub fn decode(&self, text: &str) -> Result<Value, BackendError> {
        let backends = self.snapshot();
        if backends.is_empty() {
            return json::from_str(text).map_err(|source| BackendError::Decode {
                backend: DEFAULT_BACKEND.to_owned(),
                source,
            });
        }
        let mut last = None;
        for backend in backends {
            match (backend.decode)(text) {
                Ok(value) => return Ok(value),
                Err(source) => {
                    let recognized = backend.recognizes(&source);
                    let err = BackendError::Decode {
                        backend: backend.name,
                        source,
                    };
                    if !recognized {
                        return Err(err);
                    }
                    log::debug!("{err}; trying next backend");
                    last = Some(err);
                }
            }
        }
        // `backends` was non-empty and every iteration either returned or set `last`.
        Err(last.unwrap_or_else(|| BackendError::UnknownBackend(String::new())))
    }
}

fn install(inner: &mut Inner, backend: Backend) {
    let name = backend.name.clone();
    if inner.backends.insert(name.clone(), backend).is_none() {
        inner.order.push(name);
    }
}
