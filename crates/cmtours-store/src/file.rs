//! File-backed credential store keeping a single JSON document on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::provider::{CredentialStore, StoreError};

/// Credential store persisting entries as a JSON object at a fixed path.
///
/// Writes go through a temporary sibling file followed by a rename, so a
/// crash mid-write never leaves a truncated document behind.
#[derive(Debug)]
pub struct FileCredentialStore {
    /// Path of the JSON credentials document.
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store rooted at the given path, creating parent directories.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(map_io_error)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the underlying credentials document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                if contents.trim().is_empty() {
                    return Ok(BTreeMap::new());
                }
                Ok(serde_json::from_str(&contents)?)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(map_io_error(e)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(map_io_error)?;
        fs::rename(&tmp, &self.path).map_err(map_io_error)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)?;
        debug!(key, path = %self.path.display(), "persisted credential entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// A read-only credentials location behaves like disabled storage and a
/// full disk like an exhausted quota: neither condition is transient, so
/// writes must not be retried against them.
fn map_io_error(e: std::io::Error) -> StoreError {
    match e.kind() {
        IoErrorKind::PermissionDenied | IoErrorKind::ReadOnlyFilesystem => StoreError::Disabled,
        IoErrorKind::StorageFull | IoErrorKind::QuotaExceeded => StoreError::QuotaExceeded,
        _ => StoreError::Io(e),
    }
}
