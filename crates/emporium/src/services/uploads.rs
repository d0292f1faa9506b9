//! Image uploads stored by content hash.

use tracing::{debug, info, trace};

use crate::{
    events::DomainEvent,
    models::{ImageAsset, Role, Stored, User},
    repository::eq,
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

/// Prefix of the URLs images are served under.
pub const UPLOADS_PATH: &str = "/api/uploads";
const MAX_FILE_NAME_LEN: usize = 255;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    /// Identifies the format from the leading bytes of the content.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        }
        else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        }
        else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        }
        else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && bytes.get(8 .. 12) == Some(b"WEBP".as_slice()) {
            Some(Self::Webp)
        }
        else {
            None
        }
    }

    /// Parses a MIME type, accepting the common `image/jpg` alias.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Splits a storage key into its digest and format, rejecting anything that
/// could not have been produced by an upload.
fn parse_key(key: &str) -> Option<ImageKind> {
    let (digest, ext) = key.split_once('.')?;
    let well_formed = digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if well_formed { ImageKind::from_extension(ext) } else { None }
}

fn image_lock(key: &str) -> String { format!("image:{key}") }

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// Stores an uploaded image and records it for `owner_id`.
    ///
    /// The format is taken from the content. A declared content type, when
    /// present and not `application/octet-stream`, must name the same format.
    /// Identical content is stored once and shared between records.
    ///
    /// # Errors
    ///
    /// * `Validation` for empty content
    /// * `PayloadTooLarge` above the configured upload limit
    /// * `UnsupportedMediaType` for content that is not JPEG, PNG, GIF or WebP,
    ///   or that disagrees with the declared type
    pub async fn upload_image(
        &self,
        owner_id: &str,
        file_name: Option<&str>,
        declared_type: Option<&str>,
        bytes: &[u8],
    ) -> ApiResult<Stored<ImageAsset>> {
        trace!("Uploading {} bytes for {} in tenant {}", bytes.len(), owner_id, self.slug);
        if bytes.is_empty() {
            return Err(ApiError::validation("the uploaded file is empty"));
        }
        if bytes.len() > self.config.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge {
                limit: self.config.max_upload_bytes,
            });
        }
        let kind = ImageKind::detect(bytes).ok_or_else(|| {
            ApiError::UnsupportedMediaType {
                message: "only JPEG, PNG, GIF and WebP images are accepted".to_owned(),
            }
        })?;
        if let Some(declared) = declared_type.map(str::trim) &&
            !declared.is_empty() &&
            !declared.eq_ignore_ascii_case("application/octet-stream") &&
            ImageKind::from_mime(declared) != Some(kind)
        {
            return Err(ApiError::UnsupportedMediaType {
                message: format!(
                    "declared type '{declared}' does not match the content ({})",
                    kind.content_type()
                ),
            });
        }

        let hash = emporium_crypto::hash_bytes(bytes);
        let key = format!("{hash}.{}", kind.extension());
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| key.clone(), |name| name.chars().take(MAX_FILE_NAME_LEN).collect());

        let _guard = self.locks.lock(&image_lock(&key)).await;
        if self.blobs.exists(&key).await? {
            debug!("Blob {} already stored", key);
        }
        else {
            self.blobs.put(&key, bytes).await?;
        }
        let asset = self
            .images
            .insert(ImageAsset {
                owner_id: owner_id.to_owned(),
                file_name,
                content_type: kind.content_type().to_owned(),
                size_bytes: bytes.len() as u64,
                hash,
                url: format!("{UPLOADS_PATH}/{key}"),
                key,
            })
            .await?;

        self.bus.publish(DomainEvent::ImageUploaded {
            image_id: asset.id.clone(),
            owner_id: owner_id.to_owned(),
            key:      asset.data.key.clone(),
        });
        info!("Image {} uploaded as {}", asset.id, asset.data.key);
        Ok(asset)
    }

    /// Content type and bytes of the blob stored under `key`.
    pub async fn fetch_image(&self, key: &str) -> ApiResult<(&'static str, Vec<u8>)> {
        let kind = parse_key(key).ok_or_else(|| ApiError::not_found("Image", key))?;
        let bytes = self
            .blobs
            .get(key)
            .await?
            .ok_or_else(|| ApiError::not_found("Image", key))?;
        Ok((kind.content_type(), bytes))
    }

    /// Deletes an image record, and its blob once no record refers to it.
    pub async fn delete_image(&self, actor: &Stored<User>, id: &str) -> ApiResult<()> {
        let asset = self.images.require(id).await?;
        if asset.data.owner_id != actor.id && actor.data.role != Role::Admin {
            return Err(ApiError::forbidden("You cannot delete this image"));
        }

        let _guard = self.locks.lock(&image_lock(&asset.data.key)).await;
        self.images.delete(id).await?;
        let still_used = self.images.count(&[eq("key", &asset.data.key)]).await?;
        if still_used == 0 {
            self.blobs.delete(&asset.data.key).await?;
            debug!("Blob {} removed", asset.data.key);
        }
        info!("Image {} deleted by {}", id, actor.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{admin, customer, tenant};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn test_detect_formats() {
        assert_eq!(ImageKind::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::detect(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::detect(b"GIF89a\x01\0"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::detect(WEBP), Some(ImageKind::Webp));
        assert_eq!(ImageKind::detect(b"RIFF\0\0\0\0WAVE"), None);
        assert_eq!(ImageKind::detect(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::detect(b""), None);
    }

    #[test]
    fn test_mime_and_keys() {
        assert_eq!(ImageKind::from_mime("image/jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_mime("IMAGE/PNG; charset=binary"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_mime("text/plain"), None);

        let digest = "a".repeat(64);
        assert_eq!(parse_key(&format!("{digest}.png")), Some(ImageKind::Png));
        assert_eq!(parse_key(&format!("{digest}.exe")), None);
        assert_eq!(parse_key("../../etc/passwd"), None);
        assert_eq!(parse_key(&format!("{}.png", "A".repeat(64))), None);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let (ctx, _temp_dir) = tenant().await;

        assert!(matches!(
            ctx.upload_image("u1", None, None, b"").await,
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            ctx.upload_image("u1", None, None, b"plain text").await,
            Err(ApiError::UnsupportedMediaType { .. })
        ));
        assert!(matches!(
            ctx.upload_image("u1", None, Some("image/jpeg"), PNG).await,
            Err(ApiError::UnsupportedMediaType { .. })
        ));
        let oversized = [PNG, vec![0_u8; ctx.config.max_upload_bytes].as_slice()].concat();
        assert!(matches!(
            ctx.upload_image("u1", None, None, &oversized).await,
            Err(ApiError::PayloadTooLarge { .. })
        ));
        assert_eq!(ctx.images.count(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_identical_content_shares_one_blob() {
        let (ctx, _temp_dir) = tenant().await;
        let alice = customer(&ctx, "alice@example.com").await;
        let bob = customer(&ctx, "bob@example.com").await;
        let admin = admin(&ctx).await;

        let first = ctx
            .upload_image(&alice.id, Some("cat.png"), Some("image/png"), PNG)
            .await
            .unwrap();
        let second = ctx
            .upload_image(&bob.id, None, Some("application/octet-stream"), PNG)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.data.key, second.data.key);
        assert_eq!(first.data.file_name, "cat.png");
        assert_eq!(first.data.url, format!("/api/uploads/{}", first.data.key));
        assert_eq!(first.data.size_bytes, PNG.len() as u64);

        let (content_type, bytes) = ctx.fetch_image(&first.data.key).await.unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, PNG);

        assert!(matches!(
            ctx.delete_image(&bob, &first.id).await,
            Err(ApiError::Forbidden { .. })
        ));
        ctx.delete_image(&alice, &first.id).await.unwrap();
        assert!(ctx.fetch_image(&first.data.key).await.is_ok());

        ctx.delete_image(&admin, &second.id).await.unwrap();
        assert!(matches!(
            ctx.fetch_image(&first.data.key).await,
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            ctx.fetch_image("../secret").await,
            Err(ApiError::NotFound { .. })
        ));
    }
}
