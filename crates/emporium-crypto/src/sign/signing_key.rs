use ed25519_dalek::SigningKey;
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::error::{CryptoError, KeyError};

/// Signing key management utilities
pub struct SigningKeyManager;

impl SigningKeyManager {
    /// Generate a new random signing key
    pub fn generate_key() -> SigningKey {
        trace!("Generating new signing key");
        let mut secret: [u8; 32] = rand::random();
        let key = SigningKey::from_bytes(&secret);
        secret.zeroize();
        debug!("Signing key generated successfully");
        key
    }

    /// Export key as hex
    pub fn export_key(key: &SigningKey) -> String {
        trace!("Exporting signing key");
        let mut bytes = key.to_bytes();
        let hex = hex::encode(bytes);
        bytes.zeroize();
        hex
    }

    /// Import key from hex
    pub fn import_key(hex: &str) -> Result<SigningKey, CryptoError> {
        trace!("Importing signing key from hex");
        let mut bytes = hex::decode(hex.trim()).map_err(|e| KeyError::ImportFailed(e.to_string()))?;
        let array: Result<[u8; 32], _> = bytes.as_slice().try_into();
        bytes.zeroize();
        let mut array = array.map_err(|_| CryptoError::InvalidKeyLength)?;
        let key = SigningKey::from_bytes(&array);
        array.zeroize();
        debug!("Signing key imported successfully");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let a = SigningKeyManager::generate_key();
        let b = SigningKeyManager::generate_key();
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_export_import_key() {
        let key = SigningKeyManager::generate_key();
        let hex = SigningKeyManager::export_key(&key);
        assert_eq!(hex.len(), 64);
        let imported = SigningKeyManager::import_key(&hex).unwrap();
        assert_eq!(key.to_bytes(), imported.to_bytes());
    }

    #[test]
    fn test_import_rejects_wrong_length() {
        assert!(matches!(
            SigningKeyManager::import_key("abcd"),
            Err(CryptoError::InvalidKeyLength)
        ));
        assert!(matches!(
            SigningKeyManager::import_key("not hex"),
            Err(CryptoError::KeyManagement(_))
        ));
    }
}
