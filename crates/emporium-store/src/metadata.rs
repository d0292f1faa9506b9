//! Store metadata persisted in `.store.json`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the metadata format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataVersion {
    /// Initial metadata format
    #[default]
    V1,
}

/// Store metadata stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Metadata format version
    pub version:          MetadataVersion,
    /// Store creation timestamp
    pub created_at:       DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at:       DateTime<Utc>,
    /// Total number of collections
    pub collection_count: u64,
    /// Total number of documents across all collections
    pub total_documents:  u64,
    /// Total size of all documents (bytes)
    pub total_size_bytes: u64,
}

impl StoreMetadata {
    /// Create new metadata for a store
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version:          MetadataVersion::V1,
            created_at:       now,
            updated_at:       now,
            collection_count: 0,
            total_documents:  0,
            total_size_bytes: 0,
        }
    }
}

impl Default for StoreMetadata {
    fn default() -> Self { Self::new() }
}

/// Live counters shared by the store and its collections.
#[derive(Debug, Default)]
pub struct StoreCounters {
    pub(crate) collections: AtomicU64,
    pub(crate) documents:   AtomicU64,
    pub(crate) size_bytes:  AtomicU64,
}

impl StoreCounters {
    pub(crate) fn set(&self, collections: u64, documents: u64, size_bytes: u64) {
        self.collections.store(collections, Ordering::Relaxed);
        self.documents.store(documents, Ordering::Relaxed);
        self.size_bytes.store(size_bytes, Ordering::Relaxed);
    }

    pub(crate) fn document_added(&self, size: u64) {
        self.documents.fetch_add(1, Ordering::Relaxed);
        self.size_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub(crate) fn document_resized(&self, old: u64, new: u64) {
        self.size_bytes.fetch_add(new, Ordering::Relaxed);
        saturating_sub(&self.size_bytes, old);
    }

    pub(crate) fn document_removed(&self, size: u64) {
        saturating_sub(&self.documents, 1);
        saturating_sub(&self.size_bytes, size);
    }

    pub(crate) fn collection_added(&self) { self.collections.fetch_add(1, Ordering::Relaxed); }

    pub(crate) fn collection_removed(&self, documents: u64, size: u64) {
        saturating_sub(&self.collections, 1);
        saturating_sub(&self.documents, documents);
        saturating_sub(&self.size_bytes, size);
    }

    /// Snapshot as (collections, documents, bytes).
    pub(crate) fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.collections.load(Ordering::Relaxed),
            self.documents.load(Ordering::Relaxed),
            self.size_bytes.load(Ordering::Relaxed),
        )
    }
}

fn saturating_sub(counter: &AtomicU64, amount: u64) {
    // fetch_update only fails when the closure returns None, which it never does
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(amount)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_never_underflow() {
        let counters = StoreCounters::default();
        counters.document_added(10);
        counters.document_removed(25);
        counters.document_removed(1);
        assert_eq!(counters.snapshot(), (0, 0, 0));
    }

    #[test]
    fn test_counters_track_resizes() {
        let counters = StoreCounters::default();
        counters.collection_added();
        counters.document_added(100);
        counters.document_resized(100, 140);
        assert_eq!(counters.snapshot(), (1, 1, 140));
        counters.collection_removed(1, 140);
        assert_eq!(counters.snapshot(), (0, 0, 0));
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = StoreMetadata::new();
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"version\":\"v1\""));
        let back: StoreMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
