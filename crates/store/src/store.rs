use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::loader::load_bundle;
use crate::query::QueryParams;
use crate::shape::project;
use crate::Document;

/// Owns the parsed bundle and hands out read access to it.
///
/// The document is installed once, before any reader is admitted, and is
/// never mutated afterwards. Readers take the shared lock for the duration
/// of one lookup or projection.
#[derive(Debug, Default)]
pub struct DocumentStore {
    document: RwLock<Option<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document: RwLock::new(Some(document)),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new();
        store.install(load_bundle(path)?)?;
        Ok(store)
    }

    pub fn install(&self, document: Document) -> Result<()> {
        let mut slot = self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(StoreError::AlreadyLoaded);
        }
        *slot = Some(document);
        Ok(())
    }

    /// An installed but empty root counts as not loaded.
    pub fn is_loaded(&self) -> bool {
        self.len() > 0
    }

    pub fn len(&self) -> usize {
        self.guard().as_ref().map_or(0, Document::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.read(|document| document.get(key).cloned())
    }

    /// Looks up `key` and builds its view without leaving the shared lock.
    pub fn view(&self, key: &str, params: &QueryParams) -> Result<Value> {
        self.read(|document| {
            let value = document
                .get(key)
                .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
            project(key, value, params)
        })?
    }

    /// Runs `f` under the shared lock, failing fast when nothing is loaded.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let guard = self.guard();
        match guard.as_ref() {
            Some(document) if !document.is_empty() => Ok(f(document)),
            _ => Err(StoreError::NotLoaded),
        }
    }

    // Writers only run before serving starts, so a poisoned lock still
    // guards a consistent document.
    fn guard(&self) -> RwLockReadGuard<'_, Option<Document>> {
        self.document.read().unwrap_or_else(PoisonError::into_inner)
    }
}
