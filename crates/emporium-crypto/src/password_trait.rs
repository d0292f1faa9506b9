use crate::error::CryptoError;

/// Cost parameters for password hashing.
///
/// The defaults follow the OWASP recommendation for Argon2id
/// (19 MiB of memory, 2 iterations, 1 lane). Tests and development setups may
/// lower them through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    /// Memory cost in KiB
    pub memory_kib:  u32,
    /// Number of passes over memory
    pub iterations:  u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib:  19_456,
            iterations:  2,
            parallelism: 1,
        }
    }
}

impl PasswordParams {
    /// Minimal parameters, only suitable for tests.
    pub const fn insecure_fast() -> Self {
        Self {
            memory_kib:  8,
            iterations:  1,
            parallelism: 1,
        }
    }
}

/// Core trait for password hashing schemes used in emporium-crypto.
///
/// Implementations produce self-describing PHC strings so that the algorithm
/// and its parameters travel with the stored hash. Verification therefore only
/// needs the candidate password and the stored string.
pub trait PasswordHashing: private::Sealed {
    /// Hashes a password with a freshly generated random salt.
    ///
    /// # Arguments
    /// * `password` - The plaintext password
    /// * `params` - The cost parameters
    ///
    /// # Returns
    /// A PHC formatted hash string
    ///
    /// # Errors
    /// Returns `CryptoError::Password` if the parameters are invalid or hashing fails
    fn hash_password(password: &str, params: &PasswordParams) -> Result<String, CryptoError>;

    /// Verifies a password against a stored PHC string.
    ///
    /// # Returns
    /// `true` on match, `false` on mismatch
    ///
    /// # Errors
    /// Returns `CryptoError::Password` only when the stored hash is malformed
    fn verify_password(password: &str, phc: &str) -> Result<bool, CryptoError>;
}

// Sealing the trait to prevent external implementations
pub(crate) mod private {
    pub trait Sealed {}
}
