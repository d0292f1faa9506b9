//! Server bootstrap.

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::{
    api::{router, AppState},
    auth::TokenService,
    config::AppConfig,
    tenancy::{TenantRegistry, DEFAULT_TENANT},
    ApiResult,
};

/// Opens the platform store, registers the default tenant and loads the
/// token signing key.
pub async fn build_state(config: AppConfig) -> ApiResult<AppState> {
    let config = Arc::new(config);
    let tenants = TenantRegistry::open(Arc::clone(&config)).await?;
    tenants.ensure_tenant(DEFAULT_TENANT, "Default").await?;
    let tokens = TokenService::load_or_create(
        tenants.platform(),
        config.signing_key.as_deref(),
        config.token_ttl,
    )
    .await?;

    Ok(AppState {
        config,
        tenants: Arc::new(tenants),
        tokens: Arc::new(tokens),
    })
}

/// Serves the API until Ctrl-C or SIGTERM, then flushes store metadata.
pub async fn serve(config: AppConfig) -> ApiResult<()> {
    let bind = config.bind;
    let state = build_state(config).await?;
    let tenants = Arc::clone(&state.tenants);

    let listener = TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tenants.flush().await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl-C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            },
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
