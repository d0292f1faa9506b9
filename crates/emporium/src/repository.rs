//! Typed access to the collections of a store.

use std::marker::PhantomData;

use emporium_store::{
    Aggregation,
    Collection,
    Filter,
    Query,
    SortOrder,
    Store,
    StoreError,
};
use serde_json::Value;
use tracing::trace;

use crate::{
    models::{Entity, Stored},
    pagination::{Page, PageRequest},
    ApiError,
    ApiResult,
};

/// Sort key addressing the document creation time.
pub const CREATED_AT: &str = "$created_at";
/// Sort key addressing the document update time.
pub const UPDATED_AT: &str = "$updated_at";

/// A collection whose documents decode into `T`.
#[derive(Debug, Clone)]
pub struct Repository<T> {
    collection: Collection,
    _marker:    PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    /// Opens the collection of `T` with its options.
    pub async fn open(store: &Store) -> ApiResult<Self> {
        let collection = store
            .collection_with_options(T::COLLECTION, T::collection_options())
            .await?;
        Ok(Self {
            collection,
            _marker: PhantomData,
        })
    }

    pub const fn collection(&self) -> &Collection { &self.collection }

    /// Inserts `value` under a fresh id.
    pub async fn insert(&self, value: T) -> ApiResult<Stored<T>> { self.insert_with_id(&cuid2::create_id(), value).await }

    pub async fn insert_with_id(&self, id: &str, value: T) -> ApiResult<Stored<T>> {
        trace!("Inserting {} {}", T::NAME, id);
        let doc = self
            .collection
            .insert(id, serde_json::to_value(value)?)
            .await?;
        Ok(Stored::from_document(doc)?)
    }

    /// Fetches by id. Ids that can never exist yield `None`.
    pub async fn get(&self, id: &str) -> ApiResult<Option<Stored<T>>> {
        match self.collection.get(id).await {
            Ok(Some(doc)) => Ok(Some(Stored::from_document(doc)?)),
            Ok(None) | Err(StoreError::InvalidDocumentId { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches by id, failing with `NotFound`.
    pub async fn require(&self, id: &str) -> ApiResult<Stored<T>> {
        self.get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(T::NAME, id))
    }

    /// Writes the full model back, returning the refreshed record.
    pub async fn save(&self, id: &str, value: &T) -> ApiResult<Stored<T>> {
        self.patch(id, serde_json::to_value(value)?).await
    }

    /// Shallow-merges `patch` into the stored fields.
    pub async fn patch(&self, id: &str, patch: Value) -> ApiResult<Stored<T>> {
        trace!("Patching {} {}", T::NAME, id);
        match self.collection.update(id, patch).await {
            Ok(doc) => Ok(Stored::from_document(doc)?),
            Err(StoreError::DocumentNotFound { .. }) => Err(ApiError::not_found(T::NAME, id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, id: &str) -> ApiResult<bool> {
        match self.collection.delete(id).await {
            Ok(removed) => Ok(removed),
            Err(StoreError::InvalidDocumentId { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// One page of the records matching `filters`.
    pub async fn page(
        &self,
        filters: Vec<Filter>,
        sort: Vec<(String, SortOrder)>,
        request: PageRequest,
    ) -> ApiResult<Page<Stored<T>>> {
        let query = Query {
            filters,
            sort,
            limit: Some(request.limit),
            offset: Some(request.offset()),
            projection: None,
        };
        let result = self.collection.query(query).await?;
        let items = result
            .documents
            .into_iter()
            .map(Stored::from_document)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Page::new(items, request, result.total_count))
    }

    /// Every record matching `filters`, sorted.
    pub async fn find(&self, filters: Vec<Filter>, sort: Vec<(String, SortOrder)>) -> ApiResult<Vec<Stored<T>>> {
        let query = Query {
            filters,
            sort,
            ..Query::default()
        };
        self.collection
            .query(query)
            .await?
            .documents
            .into_iter()
            .map(|doc| Stored::from_document(doc).map_err(ApiError::from))
            .collect()
    }

    pub async fn find_one(&self, filters: &[Filter]) -> ApiResult<Option<Stored<T>>> {
        match self.collection.find_one(filters).await? {
            Some(doc) => Ok(Some(Stored::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self, filters: &[Filter]) -> ApiResult<usize> { Ok(self.collection.count_matching(filters).await?) }

    pub async fn aggregate(&self, filters: &[Filter], aggregation: Aggregation) -> ApiResult<Value> {
        Ok(self.collection.aggregate(filters, aggregation).await?)
    }

    pub async fn distinct(&self, field: &str, filters: &[Filter]) -> ApiResult<Vec<Value>> {
        Ok(self.collection.distinct(field, filters).await?)
    }
}

/// `field == value` for a string value.
pub fn eq(field: &str, value: &str) -> Filter { Filter::Equals(field.to_owned(), Value::String(value.to_owned())) }

/// Newest first.
pub fn newest_first() -> Vec<(String, SortOrder)> { vec![(CREATED_AT.to_owned(), SortOrder::Descending)] }
