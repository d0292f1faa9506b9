//! Tenant registry and per-tenant contexts.
//!
//! The platform store (`<data_dir>/platform`) registers tenants in its
//! `tenants` collection. Each tenant owns a separate store under
//! `<data_dir>/tenants/<slug>`, opened on first use and kept open afterwards.

use std::{collections::HashMap, sync::Arc};

use emporium_store::{KeyedLocks, Store, StoreConfig, StoreError, StoreStats};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info, trace};

use crate::{
    config::AppConfig,
    events::{spawn_event_log, EventBus},
    models::{Address, EventRecord, ImageAsset, Order, Product, Review, Stored, Tenant, User},
    repository::Repository,
    storage::{FsImageStorage, ImageStorage},
    ApiError,
    ApiResult,
};

/// Tenant used when a request carries no `X-Tenant-Id` header.
pub const DEFAULT_TENANT: &str = "default";
/// Longest accepted tenant slug.
pub const MAX_SLUG_LEN: usize = 48;

/// Checks that `slug` is 1 to 48 characters of `[a-z0-9_-]`.
pub fn validate_slug(slug: &str) -> ApiResult<()> {
    let valid = !slug.is_empty() &&
        slug.len() <= MAX_SLUG_LEN &&
        slug.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    }
    else {
        Err(ApiError::validation(format!(
            "tenant slug must be 1 to {MAX_SLUG_LEN} characters of a-z, 0-9, '_' or '-'"
        )))
    }
}

/// Everything a request needs to work with one tenant.
///
/// Service operations are implemented on this type in [`crate::services`].
#[derive(Debug)]
pub struct TenantContext {
    pub slug:      String,
    pub config:    Arc<AppConfig>,
    pub store:     Store,
    pub users:     Repository<User>,
    pub products:  Repository<Product>,
    pub reviews:   Repository<Review>,
    pub addresses: Repository<Address>,
    pub orders:    Repository<Order>,
    pub images:    Repository<ImageAsset>,
    pub events:    Repository<EventRecord>,
    pub bus:       EventBus,
    /// Serialises rating recomputation, stock changes and per-user updates.
    pub locks:     KeyedLocks,
    pub blobs:     Arc<dyn ImageStorage>,
    event_log:     JoinHandle<()>,
}

impl TenantContext {
    /// Opens the tenant's store and starts its event log.
    pub async fn open(slug: &str, config: Arc<AppConfig>) -> ApiResult<Self> {
        trace!("Opening tenant {}", slug);
        let root = config.tenant_dir(slug);
        let store = Store::open(
            &root,
            StoreConfig {
                verification: config.verification,
                ..StoreConfig::default()
            },
        )
        .await?;

        let events = Repository::open(&store).await?;
        let bus = EventBus::new(slug);
        let event_log = spawn_event_log(&bus, events.clone());

        Ok(Self {
            slug: slug.to_owned(),
            users: Repository::open(&store).await?,
            products: Repository::open(&store).await?,
            reviews: Repository::open(&store).await?,
            addresses: Repository::open(&store).await?,
            orders: Repository::open(&store).await?,
            images: Repository::open(&store).await?,
            events,
            bus,
            locks: KeyedLocks::new(),
            blobs: Arc::new(FsImageStorage::new(root.join("uploads"))),
            event_log,
            store,
            config,
        })
    }

    pub fn stats(&self) -> StoreStats { self.store.stats() }
}

impl Drop for TenantContext {
    fn drop(&mut self) { self.event_log.abort(); }
}

/// Registered tenants and their open contexts.
#[derive(Debug)]
pub struct TenantRegistry {
    config:   Arc<AppConfig>,
    platform: Store,
    tenants:  Repository<Tenant>,
    open:     RwLock<HashMap<String, Arc<TenantContext>>>,
}

impl TenantRegistry {
    /// Opens the platform store.
    pub async fn open(config: Arc<AppConfig>) -> ApiResult<Self> {
        let platform = Store::open(
            config.platform_dir(),
            StoreConfig {
                verification: config.verification,
                ..StoreConfig::default()
            },
        )
        .await?;
        let tenants = Repository::open(&platform).await?;
        Ok(Self {
            config,
            platform,
            tenants,
            open: RwLock::new(HashMap::new()),
        })
    }

    pub const fn platform(&self) -> &Store { &self.platform }

    pub const fn config(&self) -> &Arc<AppConfig> { &self.config }

    /// Registers a new tenant.
    pub async fn create_tenant(&self, slug: &str, name: &str) -> ApiResult<Stored<Tenant>> {
        validate_slug(slug)?;
        let name = name.trim();
        let tenant = Tenant {
            name: if name.is_empty() { slug.to_owned() } else { name.to_owned() },
        };
        match self.tenants.insert_with_id(slug, tenant).await {
            Ok(created) => {
                info!("Tenant '{}' registered", slug);
                Ok(created)
            },
            Err(ApiError::Store {
                source: StoreError::DocumentAlreadyExists { .. },
            }) => Err(ApiError::conflict(format!("Tenant '{slug}' already exists"))),
            Err(e) => Err(e),
        }
    }

    /// Registers the tenant unless it already exists.
    pub async fn ensure_tenant(&self, slug: &str, name: &str) -> ApiResult<Stored<Tenant>> {
        if let Some(existing) = self.tenants.get(slug).await? {
            return Ok(existing);
        }
        let created = self.create_tenant(slug, name).await;
        if matches!(created, Err(ApiError::Conflict { .. })) {
            return self.tenants.require(slug).await;
        }
        created
    }

    /// All tenants, sorted by slug.
    pub async fn list_tenants(&self) -> ApiResult<Vec<Stored<Tenant>>> {
        self.tenants
            .find(vec![], vec![("$id".to_owned(), emporium_store::SortOrder::Ascending)])
            .await
    }

    /// The context of a registered tenant, opening it on first use.
    pub async fn tenant(&self, slug: &str) -> ApiResult<Arc<TenantContext>> {
        if let Some(context) = self.open.read().await.get(slug) {
            return Ok(Arc::clone(context));
        }

        let unknown = || {
            ApiError::UnknownTenant {
                tenant: slug.to_owned(),
            }
        };
        if validate_slug(slug).is_err() || self.tenants.get(slug).await?.is_none() {
            return Err(unknown());
        }

        let mut open = self.open.write().await;
        if let Some(context) = open.get(slug) {
            return Ok(Arc::clone(context));
        }
        let context = Arc::new(TenantContext::open(slug, Arc::clone(&self.config)).await?);
        open.insert(slug.to_owned(), Arc::clone(&context));
        debug!("Tenant '{}' opened", slug);
        Ok(context)
    }

    /// Persists the metadata of the platform store and every open tenant.
    pub async fn flush(&self) -> ApiResult<()> {
        self.platform.flush_metadata().await?;
        let open: Vec<Arc<TenantContext>> = self.open.read().await.values().cloned().collect();
        for context in open {
            context.store.flush_metadata().await?;
            trace!("Flushed metadata of tenant {}", context.slug);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry() -> (TenantRegistry, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        (TenantRegistry::open(Arc::new(config)).await.unwrap(), temp_dir)
    }

    #[test]
    fn test_validate_slug() {
        let longest = "x".repeat(MAX_SLUG_LEN);
        let too_long = "x".repeat(MAX_SLUG_LEN + 1);
        for slug in ["default", "acme-2", "a_b", longest.as_str()] {
            assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
        }
        for slug in ["", "Acme", "a b", "a/b", "ümlaut", too_long.as_str()] {
            assert!(validate_slug(slug).is_err(), "{slug} should be invalid");
        }
    }

    #[tokio::test]
    async fn test_create_list_and_open_tenants() {
        let (registry, temp_dir) = registry().await;

        registry.create_tenant("zeta", "Zeta").await.unwrap();
        registry.create_tenant("acme", "  ").await.unwrap();
        assert!(matches!(
            registry.create_tenant("acme", "Again").await,
            Err(ApiError::Conflict { .. })
        ));

        let slugs: Vec<String> = registry
            .list_tenants()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(slugs, vec!["acme", "zeta"]);

        let acme = registry.tenant("acme").await.unwrap();
        assert_eq!(acme.slug, "acme");
        assert!(temp_dir.path().join("tenants").join("acme").is_dir());
        let again = registry.tenant("acme").await.unwrap();
        assert!(Arc::ptr_eq(&acme, &again));
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let (registry, _temp_dir) = registry().await;
        for slug in ["missing", "Bad Slug"] {
            assert!(matches!(
                registry.tenant(slug).await,
                Err(ApiError::UnknownTenant { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_ensure_tenant_is_idempotent() {
        let (registry, _temp_dir) = registry().await;
        let first = registry.ensure_tenant(DEFAULT_TENANT, "Default").await.unwrap();
        let second = registry.ensure_tenant(DEFAULT_TENANT, "Other").await.unwrap();
        assert_eq!(first, second);
    }
}
