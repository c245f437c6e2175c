//! Persistence boundary.
//!
//! A document never touches the filesystem directly; it reads and writes its payload through a
//! [`DocumentStorage`] implementation with an opaque file handle type. Two implementations ship
//! with the crate:
//!
//! - [`FsStorage`]: `tokio::fs`, with [`PathBuf`] handles
//! - [`MemoryStorage`]: an in-memory map keyed by name, for hosts without a filesystem and tests

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by a [`DocumentStorage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path of the file being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The handle does not refer to an existing file.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The document was never associated with a file.
    #[error("document has no backing file")]
    NoFile,

    /// Any other storage-specific failure.
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(path.display().to_string())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Reads and writes document payloads.
///
/// Documents are single-threaded, so the returned futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait DocumentStorage {
    /// Opaque handle identifying a stored document.
    type Handle: Clone + fmt::Debug + 'static;

    /// Read the full text behind `file`.
    async fn read_text(&self, file: &Self::Handle) -> Result<String, StorageError>;

    /// Replace the full text behind `file`.
    async fn write_text(&self, file: &Self::Handle, text: &str) -> Result<(), StorageError>;

    /// Human-readable name for `file`, used as the document name.
    fn display_name(&self, file: &Self::Handle) -> String;
}

/// [`DocumentStorage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    /// Create a filesystem storage.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl DocumentStorage for FsStorage {
    type Handle = PathBuf;

    async fn read_text(&self, file: &PathBuf) -> Result<String, StorageError> {
        tokio::fs::read_to_string(file)
            .await
            .map_err(|e| StorageError::from_io(file, e))
    }

    async fn write_text(&self, file: &PathBuf, text: &str) -> Result<(), StorageError> {
        tokio::fs::write(file, text)
            .await
            .map_err(|e| StorageError::from_io(file, e))
    }

    fn display_name(&self, file: &PathBuf) -> String {
        file.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    }
}

/// [`DocumentStorage`] holding documents in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under `name`, replacing any previous contents.
    pub fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        self.files.borrow_mut().insert(name.into(), text.into());
    }

    /// Contents stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<String> {
        self.files.borrow().get(name).cloned()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl DocumentStorage for MemoryStorage {
    type Handle = String;

    async fn read_text(&self, file: &String) -> Result<String, StorageError> {
        self.get(file).ok_or_else(|| StorageError::NotFound(file.clone()))
    }

    async fn write_text(&self, file: &String, text: &str) -> Result<(), StorageError> {
        self.insert(file.clone(), text);
        Ok(())
    }

    fn display_name(&self, file: &String) -> String {
        file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.write_text(&"card.json".to_string(), "{}").await.unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(
            storage.read_text(&"card.json".to_string()).await.unwrap(),
            "{}"
        );
        assert_eq!(storage.display_name(&"card.json".to_string()), "card.json");

        let missing = storage.read_text(&"nope".to_string()).await;
        assert!(matches!(missing, Err(StorageError::NotFound(name)) if name == "nope"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_fs_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        let storage = FsStorage::new();

        storage.write_text(&path, "{\"a\": 1}").await.unwrap();
        assert_eq!(storage.read_text(&path).await.unwrap(), "{\"a\": 1}");
        assert_eq!(storage.display_name(&path), "payload.json");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_fs_storage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new();

        let missing = storage.read_text(&dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));

        // Writing into a directory path fails with a plain I/O error.
        let err = storage.write_text(&dir.path().to_path_buf(), "x").await;
        let Err(err) = err else {
            panic!("writing to a directory must fail");
        };
        assert!(matches!(err, StorageError::Io { ref path, .. } if path == dir.path()));
    }
}
