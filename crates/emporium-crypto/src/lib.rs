//! # Emporium Crypto
//!
//! Cryptographic building blocks for the Emporium storefront backend.
//!
//! - **Content hashing**: BLAKE3 digests of canonical JSON documents and raw blobs. Document hashes
//!   guard stored records against silent corruption; blob hashes give uploads content-addressed
//!   keys.
//! - **Password hashing**: Argon2id PHC strings with per-password random salts.
//! - **Signatures**: Ed25519 signatures encoded as hex.
//! - **Tokens**: compact `payload.signature` bearer tokens used for authentication.
//!
//! Traits are sealed and separated from their implementations. Secret material is zeroized after
//! use and never appears in error messages.
//!
//! ## Usage
//!
//! ```rust
//! use emporium_crypto::{hash_data, open_token, seal_token, SigningKeyManager};
//!
//! let data = serde_json::json!({"key": "value"});
//! let hash = hash_data(&data).unwrap();
//! assert_eq!(hash.len(), 64);
//!
//! let key = SigningKeyManager::generate_key();
//! let token = seal_token(&serde_json::json!({"sub": "user-1"}), &key).unwrap();
//! let claims = open_token(&token, &key.verifying_key()).unwrap();
//! assert_eq!(claims["sub"], "user-1");
//! ```

pub mod error;
pub mod hash;
pub mod hash_trait;
pub mod password;
pub mod password_trait;
pub mod sign;
pub mod sign_trait;

pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use hash::Blake3Hasher;
pub use hash_trait::HashFunction;
pub use password::Argon2PasswordHasher;
pub use password_trait::{PasswordHashing, PasswordParams};
use serde_json::Value;
pub use sign::{open_token, seal_token, Ed25519Signer, SigningKeyManager};
pub use sign_trait::SignatureAlgorithm;

/// Computes the BLAKE3 hash of the given JSON data.
pub fn hash_data(data: &Value) -> Result<String, CryptoError> { Blake3Hasher::hash_data(data) }

/// Computes the BLAKE3 hash of raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> String { Blake3Hasher::hash_bytes(bytes) }

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str, params: &PasswordParams) -> Result<String, CryptoError> {
    Argon2PasswordHasher::hash_password(password, params)
}

/// Checks a password against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, CryptoError> {
    Argon2PasswordHasher::verify_password(password, phc)
}
