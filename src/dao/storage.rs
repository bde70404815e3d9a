use std::{
    collections::{BTreeMap, HashMap},
    error::Error,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The slots could not be serialised.
    #[error("failed to encode storage contents")]
    Encode {
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Durable string slots addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Read the slot `key`, `None` when it was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Overwrite the slot `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Volatile store, used when no durable location is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Slots are cached in memory; every write rewrites the file through a
/// temporary sibling followed by a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    slots: DashMap<String, String>,
    write_gate: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// one is reported, a corrupt one is logged and replaced on next write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let slots = DashMap::new();

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(map) => {
                    debug!(path = %path.display(), slots = map.len(), "loaded local store");
                    for (key, value) in map {
                        slots.insert(key, value);
                    }
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "local store is corrupt; starting empty"
                    );
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "local store not found; starting empty");
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read `{}`", path.display()),
                    err,
                ));
            }
        }

        Ok(Self {
            path,
            slots,
            write_gate: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StorageResult<()> {
        let _gate = self
            .write_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot: BTreeMap<String, String> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let contents = serde_json::to_string_pretty(&snapshot)
            .map_err(|source| StorageError::Encode { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                StorageError::unavailable(format!("failed to create `{}`", parent.display()), err)
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).map_err(|err| {
            StorageError::unavailable(format!("failed to write `{}`", tmp.display()), err)
        })?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            StorageError::unavailable(format!("failed to replace `{}`", self.path.display()), err)
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_slots() {
        let store = MemoryStore::new();
        assert_eq!(store.get("userName").unwrap(), None);
        store.set("userName", "Ada").unwrap();
        assert_eq!(store.get("userName").unwrap().as_deref(), Some("Ada"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("scores", "[]").unwrap();
        store.set("userName", "Grace").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("scores").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("userName").unwrap().as_deref(), Some("Grace"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("scores").unwrap(), None);
        store.set("scores", "[]").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("scores"));
    }
}
