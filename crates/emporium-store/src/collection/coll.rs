use std::{path::PathBuf, sync::Arc};

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::{
    constants::{DELETED_DIR, DOCUMENT_EXTENSION},
    metadata::StoreCounters,
    StoreEvent,
    UniqueIndex,
    VerificationMode,
};

/// A collection is a namespace of documents backed by one directory.
///
/// Each document lives in `<id>.json`; soft-deleted documents move to
/// `.deleted/`. Handles are cheap to clone and all handles for the same name
/// obtained from one [`crate::Store`] share a write lock, which serialises
/// writes and unique index checks.
///
/// # Example
///
/// ```rust
/// use emporium_store::{Filter, Store, StoreConfig};
/// use serde_json::json;
///
/// # async fn example() -> emporium_store::Result<()> {
/// let store = Store::open("/tmp/emporium-doc", StoreConfig::default()).await?;
/// let users = store.collection("users").await?;
///
/// users.insert("user-123", json!({"name": "Alice", "role": "admin"})).await?;
/// let admin = users
///     .find_one(&[Filter::Equals("role".to_owned(), json!("admin"))])
///     .await?;
/// assert_eq!(admin.unwrap().id(), "user-123");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[allow(
    clippy::field_scoped_visibility_modifiers,
    reason = "fields need to be pub(crate) for internal access"
)]
pub struct Collection {
    /// The collection name.
    pub(crate) name:           String,
    /// The filesystem path to the collection directory.
    pub(crate) path:           PathBuf,
    /// Unique constraints checked on every write.
    pub(crate) unique_indexes: Arc<[UniqueIndex]>,
    /// How hash mismatches are handled on read.
    pub(crate) verification:   VerificationMode,
    /// Serialises writes to this collection.
    pub(crate) write_lock:     Arc<Mutex<()>>,
    /// Store-wide counters.
    pub(crate) counters:       Arc<StoreCounters>,
    /// Event sender for notifying the store of changes.
    pub(crate) event_sender:   mpsc::UnboundedSender<StoreEvent>,
}

impl Collection {
    /// Returns the name of the collection.
    pub fn name(&self) -> &str { &self.name }

    /// Returns the directory backing the collection.
    pub const fn path(&self) -> &PathBuf { &self.path }

    /// Returns the unique indexes enforced by this handle.
    pub fn unique_indexes(&self) -> &[UniqueIndex] { &self.unique_indexes }

    /// Returns the verification mode used on reads.
    pub const fn verification_mode(&self) -> VerificationMode { self.verification }

    pub(crate) fn document_path(&self, id: &str) -> PathBuf { self.path.join(format!("{id}.{DOCUMENT_EXTENSION}")) }

    pub(crate) fn deleted_path(&self, id: &str) -> PathBuf {
        self.path
            .join(DELETED_DIR)
            .join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    /// Emits an event to the store's event system.
    pub(crate) fn emit_event(&self, event: StoreEvent) {
        debug!("Collection '{}' emitting {:?}", self.name, event);
        if let Err(e) = self.event_sender.send(event) {
            warn!("Failed to emit collection event: {}", e);
        }
    }
}
