use crate::error::CryptoError;

/// Core trait for signature algorithms used in emporium-crypto.
///
/// Signatures are exchanged as hex strings. Associated types keep key types
/// checked at compile time and the trait is sealed.
pub trait SignatureAlgorithm: private::Sealed {
    /// The type of the signing key
    type SigningKey;
    /// The type of the verifying key
    type VerifyingKey;
    /// The type of the signature
    type Signature;

    /// Signs an arbitrary message.
    ///
    /// # Arguments
    /// * `message` - The bytes to sign
    /// * `private_key` - The signing key
    ///
    /// # Returns
    /// A hex-encoded signature string
    fn sign_message(message: &[u8], private_key: &Self::SigningKey) -> String;

    /// Verifies a hex signature over a message.
    ///
    /// # Returns
    /// `true` if the signature is valid, `false` if it does not match
    ///
    /// # Errors
    /// Returns `CryptoError::Hex` or `CryptoError::InvalidSignatureLength` if the
    /// signature cannot be decoded
    fn verify_message(
        message: &[u8],
        signature: &str,
        public_key: &Self::VerifyingKey,
    ) -> Result<bool, CryptoError>;
}

// Sealing the trait to prevent external implementations
pub(crate) mod private {
    pub trait Sealed {}
}
