use tracing::{trace, warn};

use super::coll::Collection;
use crate::{Document, Result, StoreError, VerificationMode};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Collection are intentional for organization"
)]
impl Collection {
    /// Checks the stored hash of a document against its data according to
    /// the collection's verification mode.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::HashVerificationFailed` in strict mode when the hash
    /// does not match.
    pub fn verify_document(&self, doc: &Document) -> Result<()> {
        if self.verification == VerificationMode::Off {
            return Ok(());
        }
        let actual = emporium_crypto::hash_data(&doc.data)?;
        if actual == doc.hash {
            trace!("Hash verified for document {}", doc.id);
            return Ok(());
        }

        match self.verification {
            VerificationMode::Strict => {
                Err(StoreError::HashVerificationFailed {
                    id:         doc.id.clone(),
                    collection: self.name.clone(),
                })
            },
            VerificationMode::Warn | VerificationMode::Off => {
                warn!(
                    "Hash mismatch for document {} in collection {}",
                    doc.id, self.name
                );
                Ok(())
            },
        }
    }
}
