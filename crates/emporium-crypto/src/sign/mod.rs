pub mod ed25519;
pub mod signing_key;
pub mod token;

pub use ed25519::Ed25519Signer;
pub use signing_key::SigningKeyManager;
pub use token::{open_token, seal_token};
