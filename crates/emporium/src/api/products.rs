use axum::{extract::Path, http::StatusCode, Json};
use serde::Deserialize;

use super::extract::{AdminUser, CurrentTenant, ValidJson, ValidQuery};
use crate::{
    models::{Product, Stored},
    pagination::{Page, PageParams},
    services::products::{NewProduct, ProductFilter, ProductPatch, DEFAULT_TOP_RATED},
    ApiError,
    ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    pub limit: Option<usize>,
}

pub async fn list_products(
    CurrentTenant(tenant): CurrentTenant,
    ValidQuery(filter): ValidQuery<ProductFilter>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<Stored<Product>>>> {
    let page = page.resolve(tenant.config.page_limits)?;
    Ok(Json(tenant.list_products(&filter, page).await?))
}

pub async fn top_rated(
    CurrentTenant(tenant): CurrentTenant,
    ValidQuery(query): ValidQuery<TopRatedQuery>,
) -> ApiResult<Json<Vec<Stored<Product>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_RATED);
    let max = tenant.config.page_limits.max_limit;
    if limit == 0 || limit > max {
        return Err(ApiError::validation(format!("limit must be between 1 and {max}")));
    }
    Ok(Json(tenant.top_rated_products(limit).await?))
}

pub async fn categories(CurrentTenant(tenant): CurrentTenant) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(tenant.product_categories().await?))
}

pub async fn get_product(CurrentTenant(tenant): CurrentTenant, Path(id): Path<String>) -> ApiResult<Json<Stored<Product>>> {
    Ok(Json(tenant.product(&id).await?))
}

pub async fn create_product(
    AdminUser(admin): AdminUser,
    ValidJson(input): ValidJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Stored<Product>>)> {
    let product = admin.tenant.create_product(&admin.user.id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<ProductPatch>,
) -> ApiResult<Json<Stored<Product>>> {
    Ok(Json(admin.tenant.update_product(&id, patch).await?))
}

pub async fn delete_product(AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    admin.tenant.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
