use futures::TryStreamExt as _;
use serde_json::Value;
use tokio::fs as tokio_fs;
use tracing::{debug, error, trace};

use super::coll::Collection;
use crate::{
    constants::DELETED_DIR,
    fsutil::write_atomic,
    validation::validate_document_id,
    Document,
    Result,
    StoreError,
    StoreEvent,
    UniqueIndex,
};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Collection are intentional for organization"
)]
impl Collection {
    /// Inserts a new document.
    ///
    /// # Arguments
    ///
    /// * `id` - Filesystem-safe identifier, used as the file name
    /// * `data` - The JSON data to store
    ///
    /// # Returns
    ///
    /// The stored document (version 1).
    ///
    /// # Errors
    ///
    /// * `DocumentAlreadyExists` if the id is taken
    /// * `UniqueViolation` if a unique index would be violated
    /// * `InvalidDocumentId` if the id is not filesystem safe
    ///
    /// # Example
    ///
    /// ```rust
    /// use emporium_store::{Store, StoreConfig};
    /// use serde_json::json;
    ///
    /// # async fn example() -> emporium_store::Result<()> {
    /// let store = Store::open("/tmp/emporium-insert", StoreConfig::default()).await?;
    /// let products = store.collection("products").await?;
    ///
    /// let doc = products.insert("lamp", json!({"name": "Desk lamp"})).await?;
    /// assert_eq!(doc.version(), 1);
    /// assert!(products.insert("lamp", json!({})).await.is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn insert(&self, id: &str, data: Value) -> Result<Document> {
        trace!("Inserting document with id: {}", id);
        validate_document_id(id)?;
        let _guard = self.write_lock.lock().await;

        if tokio_fs::try_exists(self.document_path(id)).await? {
            return Err(StoreError::DocumentAlreadyExists {
                id:         id.to_owned(),
                collection: self.name.clone(),
            });
        }
        self.insert_locked(id, data).await
    }

    /// Retrieves a document by id.
    ///
    /// Returns `Ok(None)` if the document doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails on I/O or parse errors, and on hash mismatches in strict mode.
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        trace!("Retrieving document with id: {}", id);
        validate_document_id(id)?;
        Ok(self.read_document(id).await?.map(|(doc, _)| doc))
    }

    /// Retrieves several documents, skipping ids that do not exist.
    ///
    /// Results follow the order of `ids`; duplicates are returned once.
    pub async fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Document>> {
        let mut seen = std::collections::HashSet::new();
        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if seen.insert(id)
                && let Some(doc) = self.get(id).await?
            {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    /// Shallow-merges `patch` into an existing document.
    ///
    /// Every top-level key of `patch` replaces the stored value, `null`
    /// included. Keys absent from the patch are kept.
    ///
    /// # Errors
    ///
    /// * `DocumentNotFound` if the document doesn't exist
    /// * `InvalidPatch` if the patch or the stored data is not an object
    /// * `UniqueViolation` if the result would violate a unique index
    pub async fn update(&self, id: &str, patch: Value) -> Result<Document> {
        trace!("Updating document with id: {}", id);
        validate_document_id(id)?;
        let Value::Object(patch) = patch
        else {
            return Err(StoreError::InvalidPatch {
                id:     id.to_owned(),
                reason: "patch must be a JSON object".to_owned(),
            });
        };

        let _guard = self.write_lock.lock().await;
        let Some((current, old_size)) = self.read_document(id).await?
        else {
            return Err(StoreError::DocumentNotFound {
                id:         id.to_owned(),
                collection: self.name.clone(),
            });
        };

        let Value::Object(mut merged) = current.data.clone()
        else {
            return Err(StoreError::InvalidPatch {
                id:     id.to_owned(),
                reason: "stored document is not a JSON object".to_owned(),
            });
        };
        merged.extend(patch);

        let next = current.revise(Value::Object(merged))?;
        self.replace_locked(&next, old_size).await?;
        Ok(next)
    }

    /// Inserts the document or replaces its data entirely if it exists.
    ///
    /// A replaced document keeps its creation time and gets the next version.
    pub async fn upsert(&self, id: &str, data: Value) -> Result<Document> {
        trace!("Upserting document with id: {}", id);
        validate_document_id(id)?;
        let _guard = self.write_lock.lock().await;

        match self.read_document(id).await? {
            Some((current, old_size)) => {
                let next = current.revise(data)?;
                self.replace_locked(&next, old_size).await?;
                Ok(next)
            },
            None => self.insert_locked(id, data).await,
        }
    }

    /// Deletes a document by moving it into `.deleted/`.
    ///
    /// Returns whether a document was removed; deleting a missing document is
    /// not an error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        trace!("Deleting document with id: {}", id);
        validate_document_id(id)?;
        let _guard = self.write_lock.lock().await;

        let source_path = self.document_path(id);
        let size = match tokio_fs::metadata(&source_path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Document {} not found, already deleted or never existed", id);
                return Ok(false);
            },
            Err(e) => {
                error!("IO error checking document {} existence: {}", id, e);
                return Err(e.into());
            },
        };

        tokio_fs::create_dir_all(self.path.join(DELETED_DIR)).await?;
        tokio_fs::rename(&source_path, self.deleted_path(id))
            .await
            .map_err(|e| {
                error!("Failed to move document {} to .deleted: {}", id, e);
                e
            })?;

        self.counters.document_removed(size);
        self.emit_event(StoreEvent::DocumentDeleted {
            collection: self.name.clone(),
            id:         id.to_owned(),
            size_bytes: size,
        });
        debug!("Document {} soft deleted successfully", id);
        Ok(true)
    }

    /// Counts the documents in the collection.
    pub async fn count(&self) -> Result<usize> {
        trace!("Counting documents in collection: {}", self.name);
        self.list()
            .try_fold(0usize, |n, _| async move { Ok(n.saturating_add(1)) })
            .await
    }

    /// Reads a document and its on-disk size.
    pub(crate) async fn read_document(&self, id: &str) -> Result<Option<(Document, u64)>> {
        match tokio_fs::read(self.document_path(id)).await {
            Ok(bytes) => {
                let mut doc: Document = serde_json::from_slice(&bytes).map_err(|e| {
                    error!("Failed to parse JSON for document {}: {}", id, e);
                    e
                })?;
                // The file name is authoritative
                id.clone_into(&mut doc.id);
                self.verify_document(&doc)?;
                Ok(Some((doc, bytes.len() as u64)))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("IO error reading document {}: {}", id, e);
                Err(e.into())
            },
        }
    }

    /// Writes version 1 of a document. Caller holds the write lock.
    async fn insert_locked(&self, id: &str, data: Value) -> Result<Document> {
        let doc = Document::new(id, data)?;
        self.check_unique(&doc).await?;
        let size = self.write_document(&doc).await?;
        self.counters.document_added(size);
        self.emit_event(StoreEvent::DocumentInserted {
            collection: self.name.clone(),
            id:         id.to_owned(),
            size_bytes: size,
        });

        debug!("Document {} inserted successfully", id);
        Ok(doc)
    }

    /// Writes a new version of an existing document. Caller holds the write lock.
    async fn replace_locked(&self, next: &Document, old_size: u64) -> Result<()> {
        self.check_unique(next).await?;
        let new_size = self.write_document(next).await?;
        self.counters.document_resized(old_size, new_size);
        self.emit_event(StoreEvent::DocumentUpdated {
            collection: self.name.clone(),
            id: next.id.clone(),
            old_size_bytes: old_size,
            new_size_bytes: new_size,
        });
        debug!("Document {} updated to version {}", next.id, next.version);
        Ok(())
    }

    async fn write_document(&self, doc: &Document) -> Result<u64> {
        let json = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.document_path(&doc.id), &json).await?;
        Ok(json.len() as u64)
    }

    /// Rejects `candidate` if another document shares a key of any unique
    /// index. Caller holds the write lock.
    async fn check_unique(&self, candidate: &Document) -> Result<()> {
        let keys: Vec<(&UniqueIndex, Vec<Value>)> = self
            .unique_indexes
            .iter()
            .filter_map(|index| index.key_of(candidate).map(|key| (index, key)))
            .collect();
        if keys.is_empty() {
            return Ok(());
        }

        let mut documents = self.all();
        while let Some(existing) = documents.try_next().await? {
            if existing.id == candidate.id {
                continue;
            }
            for &(index, ref key) in &keys {
                if let Some(existing_key) = index.key_of(&existing)
                    && UniqueIndex::keys_collide(key, &existing_key)
                {
                    debug!(
                        "Unique index {:?} violated by {} against {}",
                        index.fields, candidate.id, existing.id
                    );
                    return Err(StoreError::UniqueViolation {
                        collection:     self.name.clone(),
                        fields:         index.fields.clone(),
                        conflicting_id: existing.id,
                    });
                }
            }
        }
        Ok(())
    }
}
