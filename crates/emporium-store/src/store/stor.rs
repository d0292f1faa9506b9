use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    fs as tokio_fs,
    sync::{broadcast, mpsc},
};
use tracing::{debug, error, trace, warn};

use super::events::start_event_processor;
use crate::{
    constants::{DATA_DIR, DOCUMENT_EXTENSION, STORE_METADATA_FILE},
    fsutil::write_atomic,
    locks::KeyedLocks,
    metadata::{MetadataVersion, StoreCounters, StoreMetadata},
    StoreEvent,
    Result,
    StoreError,
    VerificationMode,
};

/// Capacity of the change broadcast; slow subscribers observe `Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Store-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Default hash verification mode for collections.
    pub verification:            VerificationMode,
    /// How often changed metadata is written back to `.store.json`.
    pub metadata_flush_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            verification:            VerificationMode::Strict,
            metadata_flush_interval: Duration::from_millis(500),
        }
    }
}

/// Point-in-time statistics of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub root_path:        PathBuf,
    pub created_at:       DateTime<Utc>,
    pub collection_count: u64,
    pub total_documents:  u64,
    pub total_size_bytes: u64,
}

/// The top-level manager for document collections.
///
/// `Store` owns a root directory laid out as:
/// - `.store.json`: store metadata (counters and timestamps)
/// - `data/<collection>/<id>.json`: one file per document
/// - `data/<collection>/.deleted/`: soft-deleted documents
///
/// Collections report every change over an internal channel. A background task
/// persists the counters at a fixed interval and rebroadcasts the events to
/// [`Store::subscribe`] receivers.
///
/// # Examples
///
/// ```no_run
/// use emporium_store::{Store, StoreConfig};
///
/// # async fn example() -> emporium_store::Result<()> {
/// let store = Store::open("/var/lib/emporium/platform", StoreConfig::default()).await?;
/// let tenants = store.collection("tenants").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Store {
    /// The root path of the store.
    pub(crate) root_path:    PathBuf,
    /// Store-wide settings.
    pub(crate) config:       StoreConfig,
    /// When the store was first created on disk.
    pub(crate) created_at:   DateTime<Utc>,
    /// Live counters shared with collections.
    pub(crate) counters:     Arc<StoreCounters>,
    /// Channel sender for collections to emit events.
    pub(crate) event_sender: mpsc::UnboundedSender<StoreEvent>,
    /// Fan-out of processed events.
    pub(crate) changes:      broadcast::Sender<StoreEvent>,
    /// One write lock per collection name.
    pub(crate) write_locks:  KeyedLocks,
    /// Background task handle for processing events.
    pub(crate) event_task:   Option<tokio::task::JoinHandle<()>>,
}

impl Store {
    /// Opens the store at `root_path`, creating it if needed.
    ///
    /// Counters are reconciled with the documents actually present on disk, so
    /// a crash between a write and the next metadata flush never leaves stale
    /// statistics behind.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the metadata file is unreadable.
    pub async fn open<P>(root_path: P, config: StoreConfig) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        trace!("Opening store at path: {:?}", root_path.as_ref());
        let root_path = root_path.as_ref().to_path_buf();
        tokio_fs::create_dir_all(root_path.join(DATA_DIR))
            .await
            .map_err(|e| {
                error!("Failed to create store directory {:?}: {}", root_path, e);
                e
            })?;

        let metadata_path = root_path.join(STORE_METADATA_FILE);
        let metadata = match tokio_fs::read_to_string(&metadata_path).await {
            Ok(content) => {
                debug!("Loading existing store metadata");
                serde_json::from_str::<StoreMetadata>(&content).map_err(|e| {
                    error!("Store metadata at {:?} is unreadable: {}", metadata_path, e);
                    StoreError::StoreCorruption {
                        reason: format!("unreadable store metadata: {e}"),
                    }
                })?
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Creating new store metadata");
                let metadata = StoreMetadata::new();
                write_atomic(&metadata_path, &serde_json::to_vec_pretty(&metadata)?).await?;
                metadata
            },
            Err(e) => return Err(e.into()),
        };

        let counters = Arc::new(StoreCounters::default());
        let (collections, documents, size) = scan_data_dir(&root_path.join(DATA_DIR)).await?;
        if (collections, documents, size) !=
            (
                metadata.collection_count,
                metadata.total_documents,
                metadata.total_size_bytes,
            )
        {
            warn!(
                "Store metadata out of date, reconciled to {} collections, {} documents, {} bytes",
                collections, documents, size
            );
        }
        counters.set(collections, documents, size);

        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        let mut store = Self {
            root_path,
            config,
            created_at: metadata.created_at,
            counters,
            event_sender,
            changes,
            write_locks: KeyedLocks::new(),
            event_task: None,
        };
        start_event_processor(&mut store, event_receiver);
        store.flush_metadata().await?;

        debug!("Store opened at {:?}", store.root_path);
        Ok(store)
    }

    /// Returns the root path of the store.
    pub const fn root_path(&self) -> &PathBuf { &self.root_path }

    /// Returns the store-wide settings.
    pub const fn config(&self) -> &StoreConfig { &self.config }

    /// Returns the creation timestamp of the store.
    pub const fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Current statistics.
    pub fn stats(&self) -> StoreStats {
        let (collection_count, total_documents, total_size_bytes) = self.counters.snapshot();
        StoreStats {
            root_path: self.root_path.clone(),
            created_at: self.created_at,
            collection_count,
            total_documents,
            total_size_bytes,
        }
    }

    /// Subscribes to change events from all collections of this store.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> { self.changes.subscribe() }

    /// Writes the current counters to `.store.json` immediately.
    pub async fn flush_metadata(&self) -> Result<()> {
        write_metadata(&self.root_path, self.created_at, &self.counters).await
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
    }
}

/// Serialises the counters into the metadata file.
pub(crate) async fn write_metadata(root_path: &Path, created_at: DateTime<Utc>, counters: &StoreCounters) -> Result<()> {
    let (collection_count, total_documents, total_size_bytes) = counters.snapshot();
    let metadata = StoreMetadata {
        version: MetadataVersion::V1,
        created_at,
        updated_at: Utc::now(),
        collection_count,
        total_documents,
        total_size_bytes,
    };
    write_atomic(
        &root_path.join(STORE_METADATA_FILE),
        &serde_json::to_vec_pretty(&metadata)?,
    )
    .await?;
    trace!("Store metadata saved");
    Ok(())
}

/// Counts collections, documents and document bytes under `data/`.
async fn scan_data_dir(data_path: &Path) -> Result<(u64, u64, u64)> {
    let mut collections = 0u64;
    let mut documents = 0u64;
    let mut size = 0u64;

    let mut entries = tokio_fs::read_dir(data_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        collections += 1;
        let (count, bytes) = scan_collection_dir(&entry.path()).await?;
        documents += count;
        size += bytes;
    }
    Ok((collections, documents, size))
}

/// Counts the documents of one collection directory and their total size.
pub(crate) async fn scan_collection_dir(path: &Path) -> Result<(u64, u64)> {
    let mut count = 0u64;
    let mut bytes = 0u64;
    let mut entries = match tokio_fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str()
        else {
            continue;
        };
        if name.starts_with('.') || Path::new(name).extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            count += 1;
            bytes += metadata.len();
        }
    }
    Ok((count, bytes))
}
