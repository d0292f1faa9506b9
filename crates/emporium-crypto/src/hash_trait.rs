use serde_json::Value;

use crate::error::CryptoError;

/// Core trait for hash functions used in emporium-crypto.
///
/// Documents are hashed for integrity checks and uploaded blobs are hashed
/// to derive content-addressed storage keys. The trait is sealed so only the
/// vetted implementations in this crate exist.
pub trait HashFunction: private::Sealed {
    /// Computes a cryptographic hash of the given JSON data.
    /// The data is canonicalized via JSON serialization before hashing to
    /// ensure deterministic results.
    ///
    /// # Errors
    /// Returns `CryptoError::Hashing` if JSON serialization fails
    fn hash_data(data: &Value) -> Result<String, CryptoError>;

    /// Computes a cryptographic hash of raw bytes as a hex string.
    fn hash_bytes(bytes: &[u8]) -> String;
}

// Sealing the trait to prevent external implementations
pub(crate) mod private {
    pub trait Sealed {}
}
