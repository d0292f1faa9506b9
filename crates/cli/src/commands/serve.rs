use std::{net::SocketAddr, time::Duration};

use clap::Args;
use emporium::{ApiError, ApiResult, AppConfig, PageLimits, PricingConfig};
use emporium_crypto::PasswordParams;
use emporium_store::VerificationMode;
use tracing::info;

use super::DataDirArgs;

/// Arguments for the serve command. Every flag can also be set through its
/// `EMPORIUM_*` environment variable.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "EMPORIUM_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub data: DataDirArgs,

    /// Lifetime of issued tokens, in hours
    #[arg(long, env = "EMPORIUM_TOKEN_TTL_HOURS", default_value_t = 7 * 24)]
    pub token_ttl_hours: u64,

    /// Page size used when a listing does not ask for one
    #[arg(long, env = "EMPORIUM_DEFAULT_PAGE_SIZE", default_value_t = 12)]
    pub default_page_size: usize,

    /// Largest page size a listing may ask for
    #[arg(long, env = "EMPORIUM_MAX_PAGE_SIZE", default_value_t = 100)]
    pub max_page_size: usize,

    /// Largest accepted image upload, in bytes
    #[arg(long, env = "EMPORIUM_MAX_UPLOAD_BYTES", default_value_t = 5 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Items total from which shipping is free, in cents
    #[arg(long, env = "EMPORIUM_FREE_SHIPPING_THRESHOLD_CENTS", default_value_t = 10_000)]
    pub free_shipping_threshold_cents: u64,

    /// Shipping fee below the free shipping threshold, in cents
    #[arg(long, env = "EMPORIUM_FLAT_SHIPPING_CENTS", default_value_t = 1_000)]
    pub flat_shipping_cents: u64,

    /// Tax rate in basis points (1500 = 15%)
    #[arg(long, env = "EMPORIUM_TAX_BASIS_POINTS", default_value_t = 1_500)]
    pub tax_basis_points: u64,

    /// Stock level at or below which a low stock event is emitted
    #[arg(long, env = "EMPORIUM_LOW_STOCK_THRESHOLD", default_value_t = 5)]
    pub low_stock_threshold: u64,

    /// Argon2 memory cost in KiB
    #[arg(long, env = "EMPORIUM_ARGON2_MEMORY_KIB", default_value_t = 19_456)]
    pub argon2_memory_kib: u32,

    /// Argon2 iterations
    #[arg(long, env = "EMPORIUM_ARGON2_ITERATIONS", default_value_t = 2)]
    pub argon2_iterations: u32,

    /// Argon2 parallelism
    #[arg(long, env = "EMPORIUM_ARGON2_PARALLELISM", default_value_t = 1)]
    pub argon2_parallelism: u32,

    /// Hex encoded Ed25519 token signing key; generated and persisted when absent
    #[arg(long, env = "EMPORIUM_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,

    /// Hash verification of stored documents: strict, warn or off
    #[arg(long, env = "EMPORIUM_VERIFICATION", default_value = "strict")]
    pub verification: VerificationMode,
}

impl ServeArgs {
    pub fn config(&self) -> AppConfig {
        AppConfig {
            bind:                self.bind,
            data_dir:            self.data.data_dir.clone(),
            token_ttl:           Duration::from_secs(self.token_ttl_hours.saturating_mul(60 * 60)),
            page_limits:         PageLimits {
                default_limit: self.default_page_size,
                max_limit:     self.max_page_size,
            },
            max_upload_bytes:    self.max_upload_bytes,
            pricing:             PricingConfig {
                free_shipping_threshold_cents: self.free_shipping_threshold_cents,
                flat_shipping_cents:           self.flat_shipping_cents,
                tax_basis_points:              self.tax_basis_points,
            },
            low_stock_threshold: self.low_stock_threshold,
            password_params:     PasswordParams {
                memory_kib:  self.argon2_memory_kib,
                iterations:  self.argon2_iterations,
                parallelism: self.argon2_parallelism,
            },
            signing_key:         self.signing_key.clone(),
            verification:        self.verification,
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs) -> ApiResult<()> {
    let config = args.config();
    if config.page_limits.default_limit == 0 || config.page_limits.default_limit > config.page_limits.max_limit {
        return Err(ApiError::validation(
            "--default-page-size must be between 1 and --max-page-size",
        ));
    }
    info!("Serving data from {}", config.data_dir.display());
    emporium::serve(config).await
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Commands};

    fn parse(args: &[&str]) -> ServeArgs {
        let cli = Cli::try_parse_from([&["emporium", "serve"][..], args].concat()).unwrap();
        match cli.command {
            Commands::Serve(args) => args,
            Commands::Tenant(_) | Commands::Admin(_) | Commands::Stats(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_defaults_match_app_config() {
        let expected = AppConfig {
            data_dir: "shop".into(),
            ..AppConfig::default()
        };
        assert_eq!(parse(&["--data-dir", "shop"]).config(), expected);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--bind",
            "0.0.0.0:9000",
            "--tax-basis-points",
            "2500",
            "--token-ttl-hours",
            "1",
            "--verification",
            "warn",
        ])
        .config();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.pricing.tax_basis_points, 2_500);
        assert_eq!(config.token_ttl, Duration::from_secs(3_600));
        assert_eq!(config.verification, VerificationMode::Warn);
    }

    #[test]
    fn test_invalid_verification_mode() {
        assert!(Cli::try_parse_from(["emporium", "serve", "--verification", "maybe"]).is_err());
    }
}
