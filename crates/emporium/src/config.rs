//! Runtime configuration of the Emporium server.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use emporium_crypto::PasswordParams;
use emporium_store::VerificationMode;

/// Pricing rules applied when orders are placed. All amounts are in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Orders whose items total reaches this amount ship for free.
    pub free_shipping_threshold_cents: u64,
    /// Flat shipping fee below the threshold.
    pub flat_shipping_cents:           u64,
    /// Tax rate in basis points of the items total (1500 = 15%).
    pub tax_basis_points:              u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold_cents: 10_000,
            flat_shipping_cents:           1_000,
            tax_basis_points:              1_500,
        }
    }
}

/// Limits applied to paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit:     usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 12,
            max_limit:     100,
        }
    }
}

/// Everything the server needs to run, with production defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind:                SocketAddr,
    /// Root directory holding the platform store and one store per tenant.
    pub data_dir:            PathBuf,
    /// Lifetime of issued bearer tokens.
    pub token_ttl:           Duration,
    pub page_limits:         PageLimits,
    /// Largest accepted image upload.
    pub max_upload_bytes:    usize,
    pub pricing:             PricingConfig,
    /// Stock level at or below which a `LowStock` event is emitted.
    pub low_stock_threshold: u64,
    /// Argon2id cost for new password hashes.
    pub password_params:     PasswordParams,
    /// Hex-encoded Ed25519 signing key. Generated and persisted when absent.
    pub signing_key:         Option<String>,
    /// Hash verification applied when documents are read.
    pub verification:        VerificationMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind:                SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir:            PathBuf::from("emporium-data"),
            token_ttl:           Duration::from_secs(7 * 24 * 60 * 60),
            page_limits:         PageLimits::default(),
            max_upload_bytes:    5 * 1024 * 1024,
            pricing:             PricingConfig::default(),
            low_stock_threshold: 5,
            password_params:     PasswordParams::default(),
            signing_key:         None,
            verification:        VerificationMode::Strict,
        }
    }
}

impl AppConfig {
    /// Directory of the platform store (tenant registry and signing key).
    pub fn platform_dir(&self) -> PathBuf { self.data_dir.join("platform") }

    /// Directory of a tenant's store.
    pub fn tenant_dir(&self, tenant: &str) -> PathBuf { self.data_dir.join("tenants").join(tenant) }
}
