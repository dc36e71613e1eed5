//! Cross-reload session storage.
//!
//! A string key/value store standing in for the browser's per-tab session
//! storage: small records that must outlive a redirect to the web wallet
//! and back. [`FileStorage`] keeps them in a JSON file so they survive a
//! process restart the same way.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::WorkflowError;

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, WorkflowError>;

    fn set(&self, key: &str, value: String) -> Result<(), WorkflowError>;

    /// Remove `key`, returning whether it was present.
    fn remove(&self, key: &str) -> Result<bool, WorkflowError>;

    /// Atomically replace the value under `key` with `f(current)`.
    /// Returning `None` removes the key.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<Option<String>, WorkflowError>,
    ) -> Result<(), WorkflowError>;
}

/// Read a JSON record stored under `key`.
pub fn load_record<T: DeserializeOwned>(
    storage: &dyn SessionStorage,
    key: &str,
) -> Result<Option<T>, WorkflowError> {
    storage
        .get(key)?
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| WorkflowError::Storage(format!("malformed record {key}: {e}")))
        })
        .transpose()
}

/// Store `record` as JSON under `key`.
pub fn store_record<T: Serialize>(
    storage: &dyn SessionStorage,
    key: &str,
    record: &T,
) -> Result<(), WorkflowError> {
    let raw = serde_json::to_string(record)
        .map_err(|e| WorkflowError::Storage(format!("serialising {key}: {e}")))?;
    storage.set(key, raw)
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, WorkflowError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), WorkflowError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, WorkflowError> {
        Ok(self.entries().remove(key).is_some())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<Option<String>, WorkflowError>,
    ) -> Result<(), WorkflowError> {
        let mut entries = self.entries();
        match f(entries.remove(key))? {
            Some(value) => entries.insert(key.to_string(), value),
            None => None,
        };
        Ok(())
    }
}

/// Session storage persisted as one JSON object on disk.
///
/// Every call reads the file, so several processes sharing a data directory
/// see each other's writes. Read-modify-write cycles hold an exclusive
/// `flock` on a sibling `.lock` file; writes go through a uniquely named
/// temporary file and a rename.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Exclusive advisory lock on the storage's lock file, released on drop.
struct StorageLock {
    file: File,
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStorage {
    pub const LOCK_EXTENSION: &'static str = "lock";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> WorkflowError {
        WorkflowError::Storage(format!("{action} {}: {e}", self.path.display()))
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Block until this process holds the cross-process lock.
    fn acquire(&self) -> Result<StorageLock, WorkflowError> {
        if let Some(parent) = self.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error("creating", e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.path.with_extension(Self::LOCK_EXTENSION))
            .map_err(|e| self.io_error("opening lock for", e))?;
        file.lock_exclusive()
            .map_err(|e| self.io_error("locking", e))?;
        Ok(StorageLock { file })
    }

    fn read(&self) -> Result<BTreeMap<String, String>, WorkflowError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                WorkflowError::Storage(format!("corrupt {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error("reading", e)),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), WorkflowError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| WorkflowError::Storage(e.to_string()))?;
        let dir = self.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error("writing", e))?;
        tmp.write_all(raw.as_bytes())
            .map_err(|e| self.io_error("writing", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error("replacing", e.error))?;
        Ok(())
    }

    /// Run `f` over the entries under both locks, writing back when it
    /// reports a change.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> Result<(T, bool), WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _flock = self.acquire()?;
        let mut entries = self.read()?;
        let (out, changed) = f(&mut entries)?;
        if changed {
            self.write(&entries)?;
        }
        Ok(out)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, WorkflowError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), WorkflowError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value);
            Ok(((), true))
        })
    }

    fn remove(&self, key: &str) -> Result<bool, WorkflowError> {
        self.modify(|entries| {
            let existed = entries.remove(key).is_some();
            Ok((existed, existed))
        })
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<Option<String>, WorkflowError>,
    ) -> Result<(), WorkflowError> {
        self.modify(|entries| {
            let current = entries.remove(key);
            let had = current.is_some();
            match f(current)? {
                Some(value) => {
                    entries.insert(key.to_string(), value);
                    Ok(((), true))
                }
                None => Ok(((), had)),
            }
        })
    }
}
