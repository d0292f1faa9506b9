use std::sync::Arc;

use clap::{Args, Subcommand};
use emporium::{models::UserProfile, ApiResult, TenantRegistry, DEFAULT_TENANT};
use tracing::info;

use super::DataDirArgs;

/// Arguments for the admin command.
#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub subcommand: AdminCommands,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create an admin, or promote the account with the given email and reset
    /// its name and password.
    Create(CreateAdminArgs),
}

#[derive(Args)]
pub struct CreateAdminArgs {
    /// Tenant the admin belongs to
    #[arg(long, env = "EMPORIUM_TENANT", default_value = DEFAULT_TENANT)]
    pub tenant:   String,
    #[arg(long)]
    pub name:     String,
    #[arg(long)]
    pub email:    String,
    #[arg(long, env = "EMPORIUM_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[command(flatten)]
    pub data:     DataDirArgs,
}

/// Run the admin command.
pub async fn run(args: AdminArgs) -> ApiResult<()> {
    match args.subcommand {
        AdminCommands::Create(create_args) => create(create_args).await,
    }
}

async fn create(args: CreateAdminArgs) -> ApiResult<()> {
    let registry = TenantRegistry::open(Arc::new(args.data.config())).await?;
    if args.tenant == DEFAULT_TENANT {
        registry.ensure_tenant(DEFAULT_TENANT, "Default").await?;
    }
    let tenant = registry.tenant(&args.tenant).await?;
    let admin = tenant
        .create_admin(&args.name, &args.email, &args.password)
        .await?;
    registry.flush().await?;
    info!("Admin {} ready in tenant {}", admin.id, args.tenant);
    println!("{}", serde_json::to_string_pretty(&UserProfile::from(&admin))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use emporium::models::Role;
    use tempfile::TempDir;

    use super::*;

    fn args(temp_dir: &TempDir, tenant: &str, name: &str) -> CreateAdminArgs {
        CreateAdminArgs {
            tenant:   tenant.to_owned(),
            name:     name.to_owned(),
            email:    "root@example.com".to_owned(),
            password: "s3cret-password".to_owned(),
            data:     DataDirArgs {
                data_dir: temp_dir.path().to_path_buf(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_admin_in_default_tenant() {
        let temp_dir = TempDir::new().unwrap();
        create(args(&temp_dir, DEFAULT_TENANT, "Root")).await.unwrap();
        create(args(&temp_dir, DEFAULT_TENANT, "Renamed")).await.unwrap();

        let registry = TenantRegistry::open(Arc::new(args(&temp_dir, DEFAULT_TENANT, "x").data.config()))
            .await
            .unwrap();
        let tenant = registry.tenant(DEFAULT_TENANT).await.unwrap();
        let admin = tenant
            .authenticate("root@example.com", "s3cret-password")
            .await
            .unwrap();
        assert_eq!(admin.data.role, Role::Admin);
        assert_eq!(admin.data.name, "Renamed");
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            create(args(&temp_dir, "ghost", "Root")).await,
            Err(emporium::ApiError::UnknownTenant { .. })
        ));
    }
}
