//! Compact signed tokens.
//!
//! A token is `<hex(payload json)>.<hex(ed25519 signature over the payload json)>`.
//! The payload is not encrypted; anything placed in it is readable by the holder.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{error::CryptoError, sign::Ed25519Signer, sign_trait::SignatureAlgorithm};

/// Serializes `payload` and signs it, producing a compact token string.
///
/// # Errors
/// Returns `CryptoError::Json` if the payload cannot be serialized
pub fn seal_token(payload: &Value, key: &SigningKey) -> Result<String, CryptoError> {
    trace!("Sealing token");
    let json = serde_json::to_vec(payload)?;
    let signature = Ed25519Signer::sign_message(&json, key);
    Ok(format!("{}.{}", hex::encode(&json), signature))
}

/// Verifies a token produced by [`seal_token`] and returns its payload.
///
/// # Errors
/// * `CryptoError::MalformedToken` if the token is not two hex segments holding JSON
/// * `CryptoError::VerificationFailed` if the signature does not match
pub fn open_token(token: &str, key: &VerifyingKey) -> Result<Value, CryptoError> {
    trace!("Opening token");
    let (payload_hex, signature) = token.split_once('.').ok_or(CryptoError::MalformedToken)?;
    let json = hex::decode(payload_hex).map_err(|_| CryptoError::MalformedToken)?;

    let valid = Ed25519Signer::verify_message(&json, signature, key).map_err(|_| CryptoError::MalformedToken)?;
    if !valid {
        debug!("Token signature rejected");
        return Err(CryptoError::VerificationFailed);
    }

    serde_json::from_slice(&json).map_err(|_| CryptoError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sign::SigningKeyManager;

    #[test]
    fn test_seal_and_open() {
        let key = SigningKeyManager::generate_key();
        let claims = json!({"sub": "u1", "tenant": "default", "exp": 10});
        let token = seal_token(&claims, &key).unwrap();
        assert_eq!(open_token(&token, &key.verifying_key()).unwrap(), claims);
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let key = SigningKeyManager::generate_key();
        let token = seal_token(&json!({"role": "customer"}), &key).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", hex::encode(br#"{"role":"admin"}"#), sig);

        assert!(matches!(
            open_token(&forged, &key.verifying_key()),
            Err(CryptoError::VerificationFailed)
        ));
    }

    #[test]
    fn test_foreign_key_fails_verification() {
        let key = SigningKeyManager::generate_key();
        let other = SigningKeyManager::generate_key();
        let token = seal_token(&json!({"sub": "u1"}), &key).unwrap();
        assert!(matches!(
            open_token(&token, &other.verifying_key()),
            Err(CryptoError::VerificationFailed)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let key = SigningKeyManager::generate_key().verifying_key();
        for token in ["", "nodot", "zz.00", "00.abcd"] {
            assert!(
                matches!(open_token(token, &key), Err(CryptoError::MalformedToken)),
                "token {token:?}"
            );
        }
    }
}
