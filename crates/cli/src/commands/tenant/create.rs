use std::sync::Arc;

use clap::Args;
use emporium::{ApiResult, TenantRegistry};

use crate::commands::DataDirArgs;

/// Arguments for the tenant create command.
#[derive(Args)]
pub struct CreateTenantArgs {
    /// Tenant slug: 1 to 48 characters of a-z, 0-9, '_' or '-'
    pub slug: String,
    /// Display name, defaults to the slug
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub data: DataDirArgs,
}

/// Run the tenant create command.
pub async fn run(args: CreateTenantArgs) -> ApiResult<()> {
    let registry = TenantRegistry::open(Arc::new(args.data.config())).await?;
    let tenant = registry
        .create_tenant(&args.slug, args.name.as_deref().unwrap_or_default())
        .await?;
    registry.flush().await?;
    println!("{}\t{}", tenant.id, tenant.data.name);
    Ok(())
}
