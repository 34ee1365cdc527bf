//! Two-document JSON store in a locked data directory.

use super::lock::{acquire_store_lock, StoreLockGuard};
use super::{Snapshot, SnippetStore};
use crate::constants::{METADATA_FILE_NAME, SAMPLE_SNIPPETS_FILE_NAME, SNIPPETS_FILE_NAME};
use crate::error::AppError;
use crate::models::{Category, Label, LegacySnippetRecord, Snippet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Items<T> {
    #[serde(default)]
    items: BTreeMap<Uuid, T>,
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    categories: Items<Category>,
    #[serde(default)]
    labels: Items<Label>,
}

/// Store writing `snippets.json` and `metadata.json` under `data_dir`.
///
/// Holds the directory's writer lock until dropped.
#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
    _lock: StoreLockGuard,
}

impl JsonStore {
    /// Open (creating if needed) the data directory and take its lock.
    ///
    /// # Errors
    /// Returns [`AppError::Locked`] when another writer holds the directory.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();
        let lock = acquire_store_lock(&data_dir)?;
        debug!("Opened JSON store at {}", data_dir.display());
        Ok(Self {
            data_dir,
            _lock: lock,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snippets_path(&self) -> PathBuf {
        self.data_dir.join(SNIPPETS_FILE_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILE_NAME)
    }

    pub fn sample_path(&self) -> PathBuf {
        self.data_dir.join(SAMPLE_SNIPPETS_FILE_NAME)
    }

    fn read_document<T>(path: &Path) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw).map(Some).map_err(|err| {
            AppError::Storage(format!("Failed to decode '{}': {}", path.display(), err))
        })
    }

    /// Write via a temp file in the same directory, then rename over `path`.
    fn write_document<T>(&self, path: &Path, value: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| AppError::Io(err.error))?;
        Ok(())
    }
}

impl SnippetStore for JsonStore {
    fn load(&self) -> Result<Snapshot, AppError> {
        let snippets: BTreeMap<Uuid, Snippet> =
            Self::read_document(&self.snippets_path())?.unwrap_or_default();
        let metadata: MetadataDocument =
            Self::read_document(&self.metadata_path())?.unwrap_or_default();

        for (key, snippet) in &snippets {
            if *key != snippet.id {
                return Err(AppError::Storage(format!(
                    "snippet keyed '{}' carries id '{}'",
                    key, snippet.id
                )));
            }
        }
        Ok(Snapshot {
            snippets: snippets.into_values().collect(),
            categories: metadata.categories.items.into_values().collect(),
            labels: metadata.labels.items.into_values().collect(),
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let metadata = MetadataDocument {
            categories: Items {
                items: snapshot
                    .categories
                    .iter()
                    .map(|c| (c.id, c.clone()))
                    .collect(),
            },
            labels: Items {
                items: snapshot.labels.iter().map(|l| (l.id, l.clone())).collect(),
            },
        };
        let snippets: BTreeMap<Uuid, &Snippet> =
            snapshot.snippets.iter().map(|s| (s.id, s)).collect();

        // Metadata first: new snippets may reference entities it introduces.
        self.write_document(&self.metadata_path(), &metadata)?;
        self.write_document(&self.snippets_path(), &snippets)?;
        debug!(
            "Saved {} snippets, {} categories, {} labels",
            snapshot.snippets.len(),
            snapshot.categories.len(),
            snapshot.labels.len()
        );
        Ok(())
    }

    /// Sample rows, offered only while `snippets.json` does not exist yet.
    fn first_run_samples(&self) -> Result<Vec<LegacySnippetRecord>, AppError> {
        if self.snippets_path().exists() {
            return Ok(Vec::new());
        }
        let samples: Vec<LegacySnippetRecord> =
            Self::read_document(&self.sample_path())?.unwrap_or_default();
        if !samples.is_empty() {
            debug!(
                "Found {} sample snippet(s) at {}",
                samples.len(),
                self.sample_path().display()
            );
        }
        Ok(samples)
    }
}
