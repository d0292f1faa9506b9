use serde::{Deserialize, Serialize};

use super::Entity;

/// An uploaded image. Several records may share one content-addressed blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub owner_id:     String,
    /// Name supplied by the uploader.
    pub file_name:    String,
    pub content_type: String,
    pub size_bytes:   u64,
    /// BLAKE3 of the content.
    pub hash:         String,
    /// Storage key, `<hash>.<ext>`.
    pub key:          String,
    pub url:          String,
}

impl Entity for ImageAsset {
    const COLLECTION: &'static str = "images";
    const NAME: &'static str = "Image";
}
