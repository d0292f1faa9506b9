use std::sync::Arc;

use clap::Args;
use emporium::{ApiResult, TenantRegistry};
use serde_json::{json, Map, Value};

use super::DataDirArgs;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub data:   DataDirArgs,
    /// Only report this tenant
    #[arg(long)]
    pub tenant: Option<String>,
}

/// Collects the statistics as JSON: `{ "platform": ..., "tenants": { slug: ... } }`.
pub async fn collect(args: &StatsArgs) -> ApiResult<Value> {
    let registry = TenantRegistry::open(Arc::new(args.data.config())).await?;
    let slugs = match args.tenant {
        Some(ref slug) => vec![slug.clone()],
        None => {
            registry
                .list_tenants()
                .await?
                .into_iter()
                .map(|tenant| tenant.id)
                .collect()
        },
    };

    let mut tenants = Map::new();
    for slug in slugs {
        let context = registry.tenant(&slug).await?;
        tenants.insert(slug, serde_json::to_value(context.stats())?);
    }
    Ok(json!({
        "platform": serde_json::to_value(registry.platform().stats())?,
        "tenants": tenants,
    }))
}

/// Run the stats command.
pub async fn run(args: StatsArgs) -> ApiResult<()> {
    let stats = collect(&args).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_stats_cover_every_tenant() {
        let temp_dir = TempDir::new().unwrap();
        let data = DataDirArgs {
            data_dir: temp_dir.path().to_path_buf(),
        };
        {
            let registry = TenantRegistry::open(Arc::new(data.config())).await.unwrap();
            registry.create_tenant("acme", "Acme").await.unwrap();
            registry.create_tenant("globex", "Globex").await.unwrap();
        }

        let all = collect(&StatsArgs {
            data:   data.clone(),
            tenant: None,
        })
        .await
        .unwrap();
        assert_eq!(all["platform"]["total_documents"], json!(2));
        assert!(all["tenants"]["acme"].is_object());
        assert!(all["tenants"]["globex"].is_object());

        let one = collect(&StatsArgs {
            data,
            tenant: Some("acme".to_owned()),
        })
        .await
        .unwrap();
        assert_eq!(one["tenants"].as_object().unwrap().len(), 1);
    }
}
