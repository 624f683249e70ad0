//! Local key-value persistence.
//!
//! The cart is persisted the same way a browser client would use local
//! storage: a flat string-to-string map with a handful of fixed keys.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use mockall::automock;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the JSON array of cart lines.
pub const CART_KEY: &str = "cart";

/// Key holding the JSON map of product snapshots for items in the cart.
pub const CART_PRODUCTS_KEY: &str = "cartProducts";

/// Errors raised by a [`LocalStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage I/O failed")]
    Io(#[from] io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("stored value is not valid JSON")]
    Json(#[from] serde_json::Error),
}

/// String key-value store.
#[automock]
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RwLock<FxHashMap<String, String>>,
}

impl MemoryLocalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);

        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    entries: RwLock<FxHashMap<String, String>>,
}

impl FileLocalStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty store. A file that is not a JSON object
    /// of strings is logged and ignored, and is overwritten on the next write.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "discarding unreadable local store");
                FxHashMap::default()
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "local store not found, starting empty");
                FxHashMap::default()
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &FxHashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;

        Ok(())
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());

        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();

        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_store_set_get_remove() -> TestResult {
        let store = MemoryLocalStore::new();

        store.set(CART_KEY, "[]")?;
        assert_eq!(store.get(CART_KEY)?.as_deref(), Some("[]"));

        store.remove(CART_KEY)?;
        assert_eq!(store.get(CART_KEY)?, None);

        Ok(())
    }

    #[test]
    fn file_store_persists_across_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("store.json");

        let store = FileLocalStore::open(&path)?;
        store.set(CART_KEY, r#"[{"productId":"p1","quantity":2}]"#)?;

        let reopened = FileLocalStore::open(&path)?;

        assert_eq!(
            reopened.get(CART_KEY)?.as_deref(),
            Some(r#"[{"productId":"p1","quantity":2}]"#)
        );

        Ok(())
    }

    #[test]
    fn file_store_missing_file_starts_empty() -> TestResult {
        let dir = tempfile::tempdir()?;

        let store = FileLocalStore::open(dir.path().join("absent.json"))?;

        assert_eq!(store.get(CART_KEY)?, None);

        Ok(())
    }

    #[test]
    fn file_store_corrupt_file_starts_empty() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json")?;

        let store = FileLocalStore::open(&path)?;

        assert_eq!(store.get(CART_PRODUCTS_KEY)?, None);

        store.set(CART_PRODUCTS_KEY, "{}")?;
        assert_eq!(
            FileLocalStore::open(&path)?.get(CART_PRODUCTS_KEY)?.as_deref(),
            Some("{}")
        );

        Ok(())
    }
}
