use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use signature::{Signer, Verifier};

use crate::{error::CryptoError, sign_trait::SignatureAlgorithm};

/// Ed25519 signature implementation backed by `ed25519-dalek`.
///
/// Signing keys zeroize their memory when dropped.
pub struct Ed25519Signer;

impl SignatureAlgorithm for Ed25519Signer {
    type Signature = Signature;
    type SigningKey = SigningKey;
    type VerifyingKey = VerifyingKey;

    fn sign_message(message: &[u8], private_key: &SigningKey) -> String {
        let signature = private_key.sign(message);
        hex::encode(signature.to_bytes())
    }

    fn verify_message(message: &[u8], signature: &str, public_key: &VerifyingKey) -> Result<bool, CryptoError> {
        let sig_bytes = hex::decode(signature).map_err(CryptoError::Hex)?;
        let sig_array: [u8; 64] = sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength)?;
        let sig = Signature::from_bytes(&sig_array);
        Ok(public_key.verify(message, &sig).is_ok())
    }
}

impl crate::sign_trait::private::Sealed for Ed25519Signer {}
