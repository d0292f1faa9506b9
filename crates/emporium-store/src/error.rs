use thiserror::Error;

/// Error type for every operation of the document store.
///
/// Variants carry the collection and document they refer to so that callers
/// can map them onto their own error taxonomy without parsing messages.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operations failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Hashing a document failed
    #[error("Cryptographic operation failed: {source}")]
    Crypto {
        #[from]
        source: emporium_crypto::CryptoError,
    },

    /// Document not found in collection
    #[error("Document '{id}' not found in collection '{collection}'")]
    DocumentNotFound {
        id:         String,
        collection: String,
    },

    /// Document already exists
    #[error("Document '{id}' already exists in collection '{collection}'")]
    DocumentAlreadyExists {
        id:         String,
        collection: String,
    },

    /// Invalid document ID format
    #[error("Invalid document ID: {id}")]
    InvalidDocumentId {
        id: String,
    },

    /// Invalid collection name format
    #[error("Invalid collection name: {name}")]
    InvalidCollectionName {
        name: String,
    },

    /// An update patch or the stored document was not a JSON object
    #[error("Invalid patch for document '{id}': {reason}")]
    InvalidPatch {
        id:     String,
        reason: String,
    },

    /// A write would give two documents the same value for a unique index
    #[error("Unique index on ({}) violated in collection '{collection}' by document '{conflicting_id}'", fields.join(", "))]
    UniqueViolation {
        collection:     String,
        fields:         Vec<String>,
        conflicting_id: String,
    },

    /// The stored hash does not match the document content
    #[error("Hash verification failed for document '{id}' in collection '{collection}'")]
    HashVerificationFailed {
        id:         String,
        collection: String,
    },

    /// Store is corrupted or in an invalid state
    #[error("Store corruption detected: {reason}")]
    StoreCorruption {
        reason: String,
    },
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
