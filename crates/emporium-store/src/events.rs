//! Change events emitted by collections.
//!
//! Collections send events over an unbounded channel to the store's background
//! task, which persists metadata and rebroadcasts the events to subscribers.
use serde::{Deserialize, Serialize};

/// Events emitted by collections when their content changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A new collection was created.
    CollectionCreated {
        /// Name of the collection that was created.
        name: String,
    },
    /// A collection was deleted.
    CollectionDeleted {
        /// Name of the collection that was deleted.
        name:             String,
        /// Number of documents that were in the collection.
        document_count:   u64,
        /// Total size in bytes of all documents in the collection.
        total_size_bytes: u64,
    },
    /// A document was inserted into a collection.
    DocumentInserted {
        /// Name of the collection.
        collection: String,
        /// Id of the document.
        id:         String,
        /// Size in bytes of the inserted document.
        size_bytes: u64,
    },
    /// A document was updated in a collection.
    DocumentUpdated {
        /// Name of the collection.
        collection:     String,
        /// Id of the document.
        id:             String,
        /// Size in bytes of the document before the update.
        old_size_bytes: u64,
        /// Size in bytes of the document after the update.
        new_size_bytes: u64,
    },
    /// A document was deleted from a collection.
    DocumentDeleted {
        /// Name of the collection.
        collection: String,
        /// Id of the document.
        id:         String,
        /// Size in bytes of the deleted document.
        size_bytes: u64,
    },
}

impl StoreEvent {
    /// Name of the collection the event concerns.
    pub fn collection(&self) -> &str {
        match *self {
            Self::CollectionCreated {
                ref name,
            } |
            Self::CollectionDeleted {
                ref name, ..
            } => name,
            Self::DocumentInserted {
                ref collection, ..
            } |
            Self::DocumentUpdated {
                ref collection, ..
            } |
            Self::DocumentDeleted {
                ref collection, ..
            } => collection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_event_wire_format() {
        let event = StoreEvent::DocumentInserted {
            collection: "users".to_owned(),
            id:         "u1".to_owned(),
            size_bytes: 256,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "document_inserted");
        assert_eq!(value["id"], "u1");
        assert_eq!(event.collection(), "users");
    }

    #[test]
    fn test_collection_accessor_for_collection_events() {
        let event = StoreEvent::CollectionDeleted {
            name:             "tmp".to_owned(),
            document_count:   1,
            total_size_bytes: 2,
        };
        assert_eq!(event.collection(), "tmp");
    }
}
