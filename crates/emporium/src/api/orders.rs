use axum::{body::Bytes, extract::Path, http::StatusCode, Json};
use serde::Deserialize;

use super::extract::{AdminUser, AuthUser, ValidJson, ValidQuery};
use crate::{
    models::{Order, OrderStatus, Stored},
    pagination::{Page, PageParams},
    services::orders::PlaceOrder,
    ApiError,
    ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

/// Optional body of the pay endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct Payment {
    pub payment_reference: Option<String>,
}

pub async fn place_order(auth: AuthUser, ValidJson(input): ValidJson<PlaceOrder>) -> ApiResult<(StatusCode, Json<Stored<Order>>)> {
    let order = auth.tenant.place_order(&auth.user.id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn my_orders(auth: AuthUser, ValidQuery(page): ValidQuery<PageParams>) -> ApiResult<Json<Page<Stored<Order>>>> {
    let page = page.resolve(auth.tenant.config.page_limits)?;
    Ok(Json(auth.tenant.my_orders(&auth.user.id, page).await?))
}

pub async fn list_orders(
    AdminUser(admin): AdminUser,
    ValidQuery(query): ValidQuery<OrderListQuery>,
    ValidQuery(page): ValidQuery<PageParams>,
) -> ApiResult<Json<Page<Stored<Order>>>> {
    let page = page.resolve(admin.tenant.config.page_limits)?;
    Ok(Json(admin.tenant.list_orders(query.status, page).await?))
}

pub async fn get_order(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Order>>> {
    Ok(Json(auth.tenant.order(&auth.user, &id).await?))
}

pub async fn pay_order(auth: AuthUser, Path(id): Path<String>, body: Bytes) -> ApiResult<Json<Stored<Order>>> {
    let payment: Payment = if body.iter().all(u8::is_ascii_whitespace) {
        Payment::default()
    }
    else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation(format!("invalid payment: {e}")))?
    };
    let order = auth
        .tenant
        .pay_order(&auth.user, &id, payment.payment_reference.as_deref())
        .await?;
    Ok(Json(order))
}

pub async fn ship_order(AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Order>>> {
    Ok(Json(admin.tenant.ship_order(&id).await?))
}

pub async fn deliver_order(AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Order>>> {
    Ok(Json(admin.tenant.deliver_order(&id).await?))
}

pub async fn cancel_order(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Stored<Order>>> {
    Ok(Json(auth.tenant.cancel_order(&auth.user, &id).await?))
}
