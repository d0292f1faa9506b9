use clap::{Args, Subcommand};
use emporium::ApiResult;

/// Arguments for the tenant command.
#[derive(Args)]
pub struct TenantArgs {
    #[command(subcommand)]
    /// The tenant subcommand to execute.
    pub subcommand: TenantCommands,
}

/// Enumeration of tenant subcommands.
#[derive(Subcommand)]
pub enum TenantCommands {
    /// Register a new tenant.
    Create(create::CreateTenantArgs),
    /// List registered tenants.
    List(list::ListTenantsArgs),
}

/// Run the tenant command.
pub async fn run(args: TenantArgs) -> ApiResult<()> {
    match args.subcommand {
        TenantCommands::Create(create_args) => create::run(create_args).await,
        TenantCommands::List(list_args) => list::run(list_args).await,
    }
}

pub mod create;
pub mod list;
