use std::sync::Arc;

use clap::Args;
use emporium::{ApiResult, TenantRegistry};

use crate::commands::DataDirArgs;

/// Arguments for the tenant list command.
#[derive(Args)]
pub struct ListTenantsArgs {
    #[command(flatten)]
    pub data: DataDirArgs,
}

/// Run the tenant list command.
pub async fn run(args: ListTenantsArgs) -> ApiResult<()> {
    let registry = TenantRegistry::open(Arc::new(args.data.config())).await?;
    for tenant in registry.list_tenants().await? {
        println!("{}\t{}\t{}", tenant.id, tenant.data.name, tenant.created_at.to_rfc3339());
    }
    Ok(())
}
