use axum::{extract::Path, http::StatusCode, Json};

use super::extract::{AuthUser, ValidJson};
use crate::{
    models::{Address, Stored},
    services::addresses::{AddressPatch, NewAddress},
    ApiResult,
};

pub async fn list_addresses(auth: AuthUser) -> ApiResult<Json<Vec<Stored<Address>>>> {
    Ok(Json(auth.tenant.list_addresses(&auth.user.id).await?))
}

pub async fn create_address(auth: AuthUser, ValidJson(input): ValidJson<NewAddress>) -> ApiResult<(StatusCode, Json<Stored<Address>>)> {
    let address = auth.tenant.create_address(&auth.user.id, input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn get_address(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Address>>> {
    Ok(Json(auth.tenant.address(&auth.user.id, &id).await?))
}

pub async fn update_address(
    auth: AuthUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<AddressPatch>,
) -> ApiResult<Json<Stored<Address>>> {
    Ok(Json(auth.tenant.update_address(&auth.user.id, &id, patch).await?))
}

pub async fn set_default_address(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Address>>> {
    Ok(Json(auth.tenant.set_default_address(&auth.user.id, &id).await?))
}

pub async fn delete_address(auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.tenant.delete_address(&auth.user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
