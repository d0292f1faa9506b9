//! HTTP interface.
//!
//! Handlers are thin: they extract the tenant and caller, delegate to the
//! service operations on [`TenantContext`](crate::tenancy::TenantContext) and
//! serialize the result. Every error is answered as `{"message": ...}`.

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post, put},
    Json,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod addresses;
pub mod events;
pub mod extract;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod state;
pub mod uploads;
pub mod users;

pub use state::AppState;

use crate::ApiError;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn health() -> Json<Value> { Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })) }

async fn not_found(uri: Uri) -> ApiError { ApiError::not_found("Route", uri.path()) }

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health))
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/me", get(users::me).put(users::update_me))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/api/products/top", get(products::top_rated))
        .route("/api/products/categories", get(products::categories))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/products/{id}/reviews",
            get(reviews::product_reviews).post(reviews::create_review),
        )
        .route("/api/reviews/mine", get(reviews::my_reviews))
        .route(
            "/api/reviews/{id}",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/api/addresses",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/api/addresses/{id}",
            get(addresses::get_address)
                .put(addresses::update_address)
                .delete(addresses::delete_address),
        )
        .route("/api/addresses/{id}/default", post(addresses::set_default_address))
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route("/api/orders/mine", get(orders::my_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/pay", post(orders::pay_order))
        .route("/api/orders/{id}/ship", post(orders::ship_order))
        .route("/api/orders/{id}/deliver", post(orders::deliver_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel_order))
        .route(
            "/api/uploads",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/uploads/{key}",
            get(uploads::fetch_image).delete(uploads::delete_image),
        )
        .route("/api/notifications", get(notifications::notifications))
        .route("/api/events", get(events::list_events))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
