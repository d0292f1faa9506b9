use async_stream::try_stream;
use futures::TryStreamExt as _;
use tracing::trace;

use super::coll::Collection;
use crate::{streaming::{stream_document_ids, BoxStream}, Document};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Collection are intentional for organization"
)]
impl Collection {
    /// Streams the ids of all live documents, in directory order.
    ///
    /// Soft-deleted documents and temporary files are not listed.
    pub fn list(&self) -> BoxStream<String> {
        trace!("Streaming document ids from collection: {}", self.name);
        stream_document_ids(self.path.clone())
    }

    /// Streams every live document with the collection's verification mode applied.
    ///
    /// Documents deleted between listing and reading are skipped.
    pub fn all(&self) -> BoxStream<Document> {
        trace!("Streaming all documents from collection: {}", self.name);
        let collection = self.clone();
        Box::pin(try_stream! {
            let mut ids = collection.list();
            while let Some(id) = ids.try_next().await? {
                if let Some((doc, _)) = collection.read_document(&id).await? {
                    yield doc;
                }
            }
        })
    }
}
