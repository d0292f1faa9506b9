use std::sync::Arc;

use tokio::fs as tokio_fs;
use tracing::{debug, error, trace};

use super::stor::{scan_collection_dir, Store};
use crate::{
    constants::DATA_DIR,
    validation::validate_collection_name,
    Collection,
    CollectionOptions,
    Result,
    StoreEvent,
};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Store are intentional for organization"
)]
impl Store {
    /// Retrieves or creates a collection with default options.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use emporium_store::{Store, StoreConfig};
    /// use serde_json::json;
    ///
    /// # async fn example() -> emporium_store::Result<()> {
    /// let store = Store::open("/tmp/emporium", StoreConfig::default()).await?;
    /// let products = store.collection("products").await?;
    /// products.insert("lamp", json!({"name": "Desk lamp", "price_cents": 2999})).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn collection(&self, name: &str) -> Result<Collection> {
        self.collection_with_options(name, CollectionOptions::default())
            .await
    }

    /// Retrieves or creates a collection with the given options.
    ///
    /// Handles obtained for the same name share one write lock, so unique index
    /// checks stay atomic across handles. Options are not persisted; every
    /// caller should pass the same options for a given collection.
    pub async fn collection_with_options(&self, name: &str, options: CollectionOptions) -> Result<Collection> {
        trace!("Accessing collection: {}", name);
        validate_collection_name(name)?;
        let data_path = self.root_path.join(DATA_DIR);
        let path = data_path.join(name);

        tokio_fs::create_dir_all(&data_path).await?;
        match tokio_fs::create_dir(&path).await {
            Ok(()) => {
                debug!("Collection '{}' created", name);
                self.counters.collection_added();
                // The receiver only disappears when the store is shutting down
                let _ = self.event_sender.send(StoreEvent::CollectionCreated {
                    name: name.to_owned(),
                });
            },
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                trace!("Collection '{}' already exists", name);
            },
            Err(e) => {
                error!("Failed to create collection directory {:?}: {}", path, e);
                return Err(e.into());
            },
        }

        Ok(Collection {
            name: name.to_owned(),
            path,
            unique_indexes: Arc::from(options.unique_indexes),
            verification: options.verification.unwrap_or(self.config.verification),
            write_lock: self.write_locks.handle(name),
            counters: self.counters.clone(),
            event_sender: self.event_sender.clone(),
        })
    }

    /// Deletes a collection and all its documents, including soft-deleted ones.
    ///
    /// Returns `false` when the collection did not exist.
    pub async fn delete_collection(&self, name: &str) -> Result<bool> {
        trace!("Deleting collection: {}", name);
        validate_collection_name(name)?;
        let path = self.root_path.join(DATA_DIR).join(name);

        let _guard = self.write_locks.lock(name).await;
        if !tokio_fs::try_exists(&path).await? {
            debug!("Collection '{}' does not exist, nothing to delete", name);
            return Ok(false);
        }

        let (document_count, total_size_bytes) = scan_collection_dir(&path).await?;
        tokio_fs::remove_dir_all(&path).await.map_err(|e| {
            error!("Failed to delete collection directory {:?}: {}", path, e);
            e
        })?;
        self.counters
            .collection_removed(document_count, total_size_bytes);
        let _ = self.event_sender.send(StoreEvent::CollectionDeleted {
            name: name.to_owned(),
            document_count,
            total_size_bytes,
        });

        debug!("Collection '{}' deleted successfully", name);
        Ok(true)
    }

    /// Lists the names of all collections, sorted.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        trace!("Listing collections");
        let data_path = self.root_path.join(DATA_DIR);
        let mut entries = match tokio_fs::read_dir(&data_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                error!("Failed to read data directory {:?}: {}", data_path, e);
                return Err(e.into());
            },
        };

        let mut collections = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() &&
                let Some(name) = entry.file_name().to_str()
            {
                collections.push(name.to_owned());
            }
        }
        collections.sort();

        debug!("Found {} collections", collections.len());
        Ok(collections)
    }
}
