//! Filesystem-backed storage rooted at a single directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use scribe_core::ports::{FileStorage, StorageError, validate_file_name};

/// Stores files as flat entries under `root`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create the storage, making sure the root directory exists.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {}", root.display(), e)))?;

        tracing::info!(root = %root.display(), "Upload storage ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_file_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, name: &str, body: Bytes) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        // Write to a temporary name first so readers never see a partial file.
        let tmp = self.root.join(format!(".{}.part", name));

        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::debug!(file = %name, bytes = body.len(), "Stored file");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(file = %name, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}
