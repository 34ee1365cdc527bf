//! Persistence collaborator: load and save whole collections.

mod json;
mod lock;

pub use json::JsonStore;
pub use lock::{acquire_store_lock, StoreLockGuard};

use crate::error::AppError;
use crate::models::{Category, Label, LegacySnippetRecord, Snippet};
use std::sync::Mutex;

/// Everything persisted, as plain records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub snippets: Vec<Snippet>,
    pub categories: Vec<Category>,
    pub labels: Vec<Label>,
}

/// Synchronous, whole-collection storage.
///
/// The engine calls `load` once at startup and `save` after each
/// mutation it is asked to persist; it never retries a failed call.
pub trait SnippetStore {
    /// # Errors
    /// Returns storage, I/O, or decoding failures unchanged.
    fn load(&self) -> Result<Snapshot, AppError>;

    /// # Errors
    /// Returns storage, I/O, or encoding failures unchanged.
    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError>;

    /// Rows to seed an empty collection with on first run.
    ///
    /// # Errors
    /// Returns storage or decoding failures unchanged.
    fn first_run_samples(&self) -> Result<Vec<LegacySnippetRecord>, AppError> {
        Ok(Vec::new())
    }
}

/// In-process store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl SnippetStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, AppError> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| AppError::Storage("memory store mutex poisoned".to_string()))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| AppError::Storage("memory store mutex poisoned".to_string()))?;
        *guard = snapshot.clone();
        Ok(())
    }
}
