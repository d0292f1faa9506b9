use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with the specified verbosity level and output format.
///
/// `RUST_LOG` takes precedence when set. Otherwise the emporium crates log at
/// INFO, DEBUG with `-v` or TRACE with `-vv`, and HTTP request spans follow
/// the same level.
pub fn init_tracing(json: bool, verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "emporium={level},emporium_store={level},emporium_cli={level},tower_http={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }
    else {
        registry.with(fmt::layer()).init();
    }
}
