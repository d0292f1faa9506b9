use argon2::{
    Algorithm,
    Argon2,
    Params,
    Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::{
    error::{CryptoError, PasswordError},
    password_trait::{PasswordHashing, PasswordParams},
};

/// Argon2id password hashing.
///
/// Hashes are emitted as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`)
/// with a random 16-byte salt per password.
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    fn engine(params: &PasswordParams) -> Result<Argon2<'static>, CryptoError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl PasswordHashing for Argon2PasswordHasher {
    fn hash_password(password: &str, params: &PasswordParams) -> Result<String, CryptoError> {
        trace!("Hashing password with Argon2id");
        let mut salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::HashingFailed(e.to_string()));
        salt_bytes.zeroize();
        let salt = salt?;

        let hash = Self::engine(params)?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();
        debug!("Password hashed successfully");
        Ok(hash)
    }

    fn verify_password(password: &str, phc: &str) -> Result<bool, CryptoError> {
        trace!("Verifying password against stored hash");
        let parsed = PasswordHash::new(phc).map_err(|_| PasswordError::MalformedHash)?;
        // Parameters are read from the PHC string itself.
        let ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        debug!("Password verification completed: {}", ok);
        Ok(ok)
    }
}

impl crate::password_trait::private::Sealed for Argon2PasswordHasher {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let params = PasswordParams::insecure_fast();
        let hash = Argon2PasswordHasher::hash_password("correct horse", &params).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(Argon2PasswordHasher::verify_password("correct horse", &hash).unwrap());
        assert!(!Argon2PasswordHasher::verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let params = PasswordParams::insecure_fast();
        let a = Argon2PasswordHasher::hash_password("same", &params).unwrap();
        let b = Argon2PasswordHasher::hash_password("same", &params).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let result = Argon2PasswordHasher::verify_password("pw", "not-a-phc-string");
        assert!(matches!(
            result,
            Err(CryptoError::Password(PasswordError::MalformedHash))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = PasswordParams {
            memory_kib:  0,
            iterations:  0,
            parallelism: 0,
        };
        assert!(Argon2PasswordHasher::hash_password("pw", &params).is_err());
    }
}
