//! Blob storage for uploaded images.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use emporium_store::fsutil::write_atomic;
use tokio::fs as tokio_fs;
use tracing::{debug, trace};

/// Key/value storage of image bytes.
///
/// Keys are produced by the upload service and are always of the form
/// `<hex digest>.<extension>`.
#[async_trait]
pub trait ImageStorage: Send + Sync + std::fmt::Debug {
    /// Stores `bytes` under `key`, replacing any previous content.
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Reads the content under `key`, `None` when absent.
    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Whether `key` holds content.
    async fn exists(&self, key: &str) -> io::Result<bool>;

    /// Removes `key`, returning whether it existed.
    async fn delete(&self, key: &str) -> io::Result<bool>;
}

/// Stores every blob as a file in one directory.
#[derive(Debug, Clone)]
pub struct FsImageStorage {
    root: PathBuf,
}

impl FsImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn path(&self, key: &str) -> PathBuf { self.root.join(key) }
}

#[async_trait]
impl ImageStorage for FsImageStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        trace!("Storing blob {}", key);
        tokio_fs::create_dir_all(&self.root).await?;
        write_atomic(&self.path(key), bytes)
            .await
            .map_err(io::Error::other)
    }

    async fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio_fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn exists(&self, key: &str) -> io::Result<bool> { tokio_fs::try_exists(self.path(key)).await }

    async fn delete(&self, key: &str) -> io::Result<bool> {
        match tokio_fs::remove_file(self.path(key)).await {
            Ok(()) => {
                debug!("Removed blob {}", key);
                Ok(true)
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_storage_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FsImageStorage::new(temp_dir.path().join("uploads"));

        assert_eq!(storage.get("a.png").await.unwrap(), None);
        assert!(!storage.exists("a.png").await.unwrap());

        storage.put("a.png", b"bytes").await.unwrap();
        assert!(storage.exists("a.png").await.unwrap());
        assert_eq!(storage.get("a.png").await.unwrap(), Some(b"bytes".to_vec()));

        assert!(storage.delete("a.png").await.unwrap());
        assert!(!storage.delete("a.png").await.unwrap());
    }
}
