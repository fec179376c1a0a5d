//! Type registry: resolves dotted type paths on restore.
//!
//! Only registered paths resolve. Nothing is looked up dynamically, so
//! restoring never runs code the embedding application did not register.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::reflect::{Reflect, TypePath};
use crate::value::{ObjectRef, BUILTIN_TYPE_PATHS};

/// Builds a default instance, ready to be populated.
pub type Constructor = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

#[derive(Clone)]
pub struct TypeRegistration {
    path: String,
    constructor: Option<Constructor>,
}

impl TypeRegistration {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Symbols resolve as type references but have no constructor.
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn construct(&self) -> Result<ObjectRef> {
        match &self.constructor {
            Some(ctor) => Ok(ctor()),
            None => Err(Error::NotConstructible(self.path.clone())),
        }
    }
}

impl fmt::Debug for TypeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistration")
            .field("path", &self.path)
            .field("constructible", &self.is_constructible())
            .finish()
    }
}

/// Shared name→constructor table. Clones are handles to the same table.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    inner: Arc<RwLock<HashMap<String, TypeRegistration>>>,
}

fn construct_default<T: Reflect + Default>() -> ObjectRef {
    ObjectRef::new(T::default())
}

impl TypeRegistry {
    /// A registry holding the builtin value-kind symbols.
    pub fn new() -> Self {
        let registry = Self::empty();
        for path in BUILTIN_TYPE_PATHS {
            registry.register_symbol(path);
        }
        registry
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, TypeRegistration>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, TypeRegistration>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, path: String, constructor: Option<Constructor>) {
        log::debug!(
            "registered type `{path}`{}",
            if constructor.is_some() { "" } else { " (symbol)" }
        );
        let registration = TypeRegistration {
            path: path.clone(),
            constructor,
        };
        self.write().insert(path, registration);
    }

    /// Registers `T` under [`TypePath::type_path`], constructed with `Default`.
    pub fn register<T: Reflect + TypePath + Default>(&self) {
        self.insert(
            T::type_path().to_owned(),
            Some(Arc::new(construct_default::<T>)),
        );
    }

    pub fn register_with<F>(&self, path: impl Into<String>, constructor: F)
    where
        F: Fn() -> ObjectRef + Send + Sync + 'static,
    {
        self.insert(path.into(), Some(Arc::new(constructor)));
    }

    /// Makes `path` resolvable as a type reference without a constructor.
    pub fn register_symbol(&self, path: impl Into<String>) {
        self.insert(path.into(), None);
    }

    pub fn unregister(&self, path: &str) -> bool {
        self.write().remove(path).is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(path)
    }

    pub fn resolve(&self, path: &str) -> Result<TypeRegistration> {
        self.read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::TypeResolution(path.to_owned()))
    }

    pub fn construct(&self, path: &str) -> Result<ObjectRef> {
        // The lock is released before the constructor runs.
        self.resolve(path)?.construct()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}
