use axum::{extract::Path, http::StatusCode, Json};

use super::extract::{AuthUser, CurrentTenant, ValidJson, ValidQuery};
use crate::{
    models::{Review, Stored},
    pagination::{Page, PageParams},
    services::reviews::{NewReview, ReviewPatch},
    ApiResult,
};

pub async fn product_reviews(
    CurrentTenant(tenant): CurrentTenant,
    Path(product_id): Path<String>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<Stored<Review>>>> {
    let page = page.resolve(tenant.config.page_limits)?;
    tenant.product(&product_id).await?;
    Ok(Json(tenant.product_reviews(&product_id, page).await?))
}

pub async fn create_review(
    auth: AuthUser,
    Path(product_id): Path<String>,
    ValidJson(input): ValidJson<NewReview>,
) -> ApiResult<(StatusCode, Json<Stored<Review>>)> {
    let review = auth
        .tenant
        .create_review(&auth.user, &product_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn my_reviews(auth: AuthUser, ValidQuery(page): ValidQuery<PageParams>) -> ApiResult<Json<Page<Stored<Review>>>> {
    let page = page.resolve(auth.tenant.config.page_limits)?;
    Ok(Json(auth.tenant.user_reviews(&auth.user.id, page).await?))
}

pub async fn update_review(
    auth: AuthUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<ReviewPatch>,
) -> ApiResult<Json<Stored<Review>>> {
    Ok(Json(auth.tenant.update_review(&auth.user, &id, patch).await?))
}

pub async fn delete_review(auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.tenant.delete_review(&auth.user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
