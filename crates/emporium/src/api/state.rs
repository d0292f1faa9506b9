use std::sync::Arc;

use crate::{auth::TokenService, config::AppConfig, tenancy::TenantRegistry};

/// Shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config:  Arc<AppConfig>,
    pub tenants: Arc<TenantRegistry>,
    pub tokens:  Arc<TokenService>,
}
