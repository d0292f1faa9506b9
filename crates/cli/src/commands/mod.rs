use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use emporium::{AppConfig, ApiResult};

/// Admin account commands.
mod admin;
/// HTTP server command.
mod serve;
/// Store statistics command.
mod stats;
/// Tenant management commands.
mod tenant;

/// Runs and administers an Emporium storefront.
#[derive(Parser)]
#[command(name = "emporium", version)]
pub struct Cli {
    #[command(subcommand)]
    /// The subcommand to execute.
    pub command: Commands,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (can be used multiple times: -v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API until interrupted.
    Serve(serve::ServeArgs),
    /// Register or list tenants.
    Tenant(tenant::TenantArgs),
    /// Manage admin accounts.
    Admin(admin::AdminArgs),
    /// Print document counts and sizes of the platform and tenant stores.
    Stats(stats::StatsArgs),
}

/// Location of the data directory, shared by every command.
#[derive(Args, Debug, Clone)]
pub struct DataDirArgs {
    /// Directory holding the platform and tenant stores
    #[arg(long, env = "EMPORIUM_DATA_DIR", default_value = "emporium-data")]
    pub data_dir: PathBuf,
}

impl DataDirArgs {
    /// Default configuration rooted at the data directory.
    pub fn config(&self) -> AppConfig {
        AppConfig {
            data_dir: self.data_dir.clone(),
            ..AppConfig::default()
        }
    }
}

/// Dispatches to the command handler.
pub async fn run_command(command: Commands) -> ApiResult<()> {
    match command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Tenant(args) => tenant::run(args).await,
        Commands::Admin(args) => admin::run(args).await,
        Commands::Stats(args) => stats::run(args).await,
    }
}
