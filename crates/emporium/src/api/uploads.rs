use axum::{
    extract::{multipart::MultipartError, Multipart, Path},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use tracing::trace;

use super::extract::{AuthUser, CurrentTenant};
use crate::{
    models::{ImageAsset, Stored},
    ApiError,
    ApiResult,
};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

fn multipart_error(error: &MultipartError, limit: usize) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    }
    else {
        ApiError::validation(error.body_text())
    }
}

pub async fn upload_image(auth: AuthUser, mut multipart: Multipart) -> ApiResult<(StatusCode, Json<Stored<ImageAsset>>)> {
    let limit = auth.tenant.config.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            trace!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e, limit))?;
        let asset = auth
            .tenant
            .upload_image(&auth.user.id, file_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(asset)));
    }
    Err(ApiError::validation(format!("multipart field '{IMAGE_FIELD}' is required")))
}

pub async fn fetch_image(CurrentTenant(tenant): CurrentTenant, Path(key): Path<String>) -> ApiResult<impl IntoResponse> {
    let (content_type, bytes) = tenant.fetch_image(&key).await?;
    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}

/// Deletes the image record with the given id.
pub async fn delete_image(auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.tenant.delete_image(&auth.user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
