//! Multi-tenant storefront backend.
//!
//! Each tenant's users, catalogue, reviews, addresses, orders and images live
//! in their own [`emporium_store::Store`]. Business rules are implemented as
//! operations on [`TenantContext`] in [`services`]; [`api`] exposes them over
//! HTTP with axum, and [`server`] wires everything together.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod server;
pub mod services;
pub mod storage;
pub mod tenancy;

pub use api::{router, AppState};
pub use auth::{Claims, TokenService};
pub use config::{AppConfig, PageLimits, PricingConfig};
pub use error::{ApiError, ApiResult};
pub use events::{DomainEvent, EventBus, EventEnvelope};
pub use server::{build_state, serve};
pub use tenancy::{TenantContext, TenantRegistry, DEFAULT_TENANT};
