/// Unified error type for every operation of the crypto crate.
///
/// Messages never contain key material, password bytes or token payloads, so
/// callers can log them verbatim. The sub-enums group failures by concern while
/// keeping a flat top-level API.
#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    /// Errors related to hashing operations
    #[error("Hashing error: {0}")]
    Hashing(#[from] HashError),

    /// Errors related to key management
    #[error("Key management error: {0}")]
    KeyManagement(#[from] KeyError),

    /// Errors related to password hashing
    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Invalid signature length
    #[error("Invalid signature length")]
    InvalidSignatureLength,

    /// Invalid key length
    #[error("Invalid key length")]
    InvalidKeyLength,

    /// A token did not have the `payload.signature` shape
    #[error("Malformed token")]
    MalformedToken,

    /// Verification failed
    #[error("Verification failed")]
    VerificationFailed,
}

/// Specific errors for hashing operations
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// JSON serialization failed during hashing
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Specific errors for key management operations
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    /// Key import failed
    #[error("Key import failed: {0}")]
    ImportFailed(String),
}

/// Specific errors for password hashing
#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    /// The Argon2 cost parameters were rejected
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),

    /// Hashing the password failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// The stored hash is not a valid PHC string
    #[error("Malformed password hash")]
    MalformedHash,
}
