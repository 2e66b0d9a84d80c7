//! Durable key-value store.
//!
//! Plays the part browser local storage plays for a web frontend: a handful
//! of string values (the cached agent id, the session) that survive restarts.
//! Nothing in it is authoritative; the gateway is.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use thiserror::Error;
use uuid::Uuid;

/// Keys written by this crate.
pub mod keys {
    /// Cached delivery agent id.
    pub const AGENT_ID: &str = "agentId";
    /// Bearer token of the current session.
    pub const TOKEN: &str = "token";
    /// Role of the current session.
    pub const ROLE: &str = "role";
    /// Client id of the current session.
    pub const CLIENT_ID: &str = "clientId";
    /// Username of the current session.
    pub const USERNAME: &str = "username";
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a JSON string map.
    #[error("Corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The lock guarding the backing file could not be taken.
    #[error("Could not lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A previous holder of the in-memory lock panicked.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A string-to-string store that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON file store.
///
/// The whole map is rewritten on every change through a temporary file and a
/// rename, so a crash never leaves a half-written file behind. A missing file
/// reads as an empty store and is created on the first write.
///
/// Changes hold an exclusive advisory lock on a `<file>.lock` sidecar for the
/// whole read-modify-write, so several processes (or several stores opened on
/// the same path) can share one state file without losing each other's keys.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Open a store backed by `path`. The file does not need to exist.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sidecar(&path, "lock");
        Self { path, lock_path }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(map).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // Unique per writer, in the same directory so the rename stays atomic.
        let tmp = sidecar(
            &self.path,
            &format!("{}.{:08x}.tmp", std::process::id(), Uuid::new_v4().as_fields().0),
        );
        if let Err(e) = std::fs::write(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Io { path: tmp, source: e });
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            self.io_error(e)
        })
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| StoreError::Io {
                path: self.lock_path.clone(),
                source,
            })?;
        lock_file.lock_exclusive().map_err(|source| StoreError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;

        let mut map = self.read_map()?;
        if apply(&mut map) {
            self.write_map(&map)?;
        }
        // Released when `lock_file` is dropped.
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|map| {
            map.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|map| map.remove(key).is_some())
    }
}

/// `state.json` -> `.state.json.<suffix>`, next to the original.
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| "store".as_ref()));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// In-memory store, for tests and one-shot use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}
