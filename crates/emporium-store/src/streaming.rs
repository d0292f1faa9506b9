//! Streaming utilities for document processing.

use std::{path::PathBuf, pin::Pin};

use async_stream::try_stream;
use futures::Stream;
use tokio::fs as tokio_fs;

use crate::{constants::DOCUMENT_EXTENSION, Result, StoreError};

/// Boxed stream type returned by collection listings.
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Streams document ids from a collection directory.
///
/// Hidden entries (the `.deleted/` directory and temporary files) are
/// skipped. A missing directory yields an empty stream.
pub fn stream_document_ids(collection_path: PathBuf) -> BoxStream<String> {
    Box::pin(try_stream! {
        let mut entries = match tokio_fs::read_dir(&collection_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => Err(StoreError::from(e))?,
        };

        while let Some(entry) = entries.next_entry().await.map_err(StoreError::from)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(id) = name.strip_suffix(DOCUMENT_EXTENSION).and_then(|s| s.strip_suffix('.'))
                && entry.file_type().await.map_err(StoreError::from)?.is_file()
            {
                yield id.to_owned();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt as _;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_stream_document_ids() {
        let temp_dir = TempDir::new().unwrap();
        let collection_path = temp_dir.path().join("collection");
        tokio_fs::create_dir(&collection_path).await.unwrap();
        for id in ["doc1", "doc2", "doc3"] {
            tokio_fs::write(collection_path.join(format!("{id}.json")), b"{}")
                .await
                .unwrap();
        }
        tokio_fs::write(collection_path.join(".tmp-x.json"), b"{}").await.unwrap();
        tokio_fs::write(collection_path.join("notes.txt"), b"").await.unwrap();
        tokio_fs::create_dir(collection_path.join(".deleted")).await.unwrap();

        let mut found: Vec<String> = stream_document_ids(collection_path).try_collect().await.unwrap();
        found.sort();
        assert_eq!(found, vec!["doc1", "doc2", "doc3"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let found: Vec<String> = stream_document_ids(temp_dir.path().join("nope"))
            .try_collect()
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_path_errors() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        tokio_fs::write(&file, b"x").await.unwrap();
        let result: Result<Vec<String>> = stream_document_ids(file).try_collect().await;
        assert!(result.is_err());
    }
}
