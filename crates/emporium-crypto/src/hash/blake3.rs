use serde_json::Value;

use crate::{
    error::{CryptoError, HashError},
    hash_trait::HashFunction,
};

/// BLAKE3 hash implementation.
///
/// Produces 256-bit digests rendered as 64 lowercase hex characters.
pub struct Blake3Hasher;

impl HashFunction for Blake3Hasher {
    fn hash_data(data: &Value) -> Result<String, CryptoError> {
        let json_str = serde_json::to_string(data).map_err(HashError::from)?;
        Ok(Self::hash_bytes(json_str.as_bytes()))
    }

    fn hash_bytes(bytes: &[u8]) -> String { blake3::hash(bytes).to_hex().to_string() }
}

impl crate::hash_trait::private::Sealed for Blake3Hasher {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash_is_deterministic() {
        let data = serde_json::json!({"name": "Desk lamp", "price_cents": 2999});
        let hash = Blake3Hasher::hash_data(&data).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, Blake3Hasher::hash_data(&data).unwrap());
    }

    #[test]
    fn test_blake3_hash_changes_with_content() {
        let a = Blake3Hasher::hash_data(&serde_json::json!({"stock": 1})).unwrap();
        let b = Blake3Hasher::hash_data(&serde_json::json!({"stock": 2})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_bytes_matches_known_vector() {
        // BLAKE3 of the empty input
        assert_eq!(
            Blake3Hasher::hash_bytes(b""),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }
}
