//! Filesystem helpers shared by the store and its collections.

use std::path::Path;

use tokio::fs as tokio_fs;
use tracing::error;

use crate::{constants::TEMP_FILE_PREFIX, Result};

/// Writes `contents` to a hidden temporary file next to `path` and renames it
/// into place, so readers never observe a partially written file.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let temp_path = parent.join(format!(
        "{}{}-{}",
        TEMP_FILE_PREFIX,
        file_name,
        cuid2::create_id()
    ));

    if let Err(e) = tokio_fs::write(&temp_path, contents).await {
        error!("Failed to write temporary file {:?}: {}", temp_path, e);
        return Err(e.into());
    }
    if let Err(e) = tokio_fs::rename(&temp_path, path).await {
        error!("Failed to move {:?} into place at {:?}: {}", temp_path, path, e);
        // Best effort cleanup; the rename error is what matters
        let _ = tokio_fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
