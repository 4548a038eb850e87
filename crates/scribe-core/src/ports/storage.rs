//! File storage port for uploaded media.

use async_trait::async_trait;
use bytes::Bytes;

/// Flat key/value file storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `body` under `name`, replacing any existing file.
    async fn put(&self, name: &str, body: Bytes) -> Result<(), StorageError>;

    /// Read a stored file. `Ok(None)` if it does not exist.
    async fn get(&self, name: &str) -> Result<Option<Bytes>, StorageError>;

    /// Remove a stored file. Missing files are not an error.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Upload and storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Upload is empty")]
    Empty,

    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),
}

/// Accept only single-segment names made of safe characters.
pub fn validate_file_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
