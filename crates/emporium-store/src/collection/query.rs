use std::{cmp::Ordering, collections::HashSet, time::Instant};

use futures::TryStreamExt as _;
use serde_json::Value;
use tracing::{debug, trace};

use super::coll::Collection;
use crate::{
    comparison::{compare_values, values_equal},
    filtering::matches_filters,
    projection::project_document,
    Document,
    Filter,
    Query,
    QueryResult,
    Result,
    SortOrder,
};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for Collection are intentional for organization"
)]
impl Collection {
    /// Executes a structured query against the collection.
    ///
    /// Matching documents are sorted by each sort key in turn, ties broken by
    /// id, so paging through a result is stable. `total_count` is the number
    /// of matches before `offset` and `limit` are applied. Projection only
    /// shapes the returned page.
    ///
    /// # Example
    ///
    /// ```rust
    /// use emporium_store::{Operator, QueryBuilder, SortOrder, Store, StoreConfig};
    /// use serde_json::json;
    ///
    /// # async fn example() -> emporium_store::Result<()> {
    /// let store = Store::open("/tmp/emporium-query", StoreConfig::default()).await?;
    /// let products = store.collection("products").await?;
    ///
    /// products.insert("p1", json!({"name": "Lamp", "price": 30, "tag": "home"})).await?;
    /// products.insert("p2", json!({"name": "Mug", "price": 8, "tag": "home"})).await?;
    /// products.insert("p3", json!({"name": "Pen", "price": 2, "tag": "office"})).await?;
    ///
    /// let query = QueryBuilder::new()
    ///     .filter("tag", Operator::Equals, json!("home"))
    ///     .sort("price", SortOrder::Ascending)
    ///     .limit(1)
    ///     .build();
    ///
    /// let result = products.query(query).await?;
    /// assert_eq!(result.total_count, 2);
    /// assert_eq!(result.documents[0].id(), "p2");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query(&self, query: Query) -> Result<QueryResult> {
        let start_time = Instant::now();
        trace!("Executing query on collection: {}", self.name);

        let mut matching = self.collect_matching(&query.filters).await?;
        sort_documents(&mut matching, &query.sort);

        let total_count = matching.len();
        let offset = query.offset.unwrap_or(0);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX));
        let documents: Vec<Document> = match query.projection {
            Some(ref fields) => page.map(|doc| project_document(&doc, fields)).collect(),
            None => page.collect(),
        };

        let execution_time = start_time.elapsed();
        debug!(
            "Query on {} matched {} documents, returned {} in {:?}",
            self.name,
            total_count,
            documents.len(),
            execution_time
        );

        Ok(QueryResult {
            documents,
            total_count,
            execution_time,
        })
    }

    /// Returns the first matching document in id order.
    pub async fn find_one(&self, filters: &[Filter]) -> Result<Option<Document>> {
        let mut matching = self.collect_matching(filters).await?;
        sort_documents(&mut matching, &[]);
        Ok(matching.into_iter().next())
    }

    /// Counts the documents matching `filters`.
    pub async fn count_matching(&self, filters: &[Filter]) -> Result<usize> {
        self.all()
            .try_fold(0usize, |n, doc| {
                let hit = matches_filters(&doc, filters);
                async move { Ok(if hit { n.saturating_add(1) } else { n }) }
            })
            .await
    }

    /// Returns the distinct values of `field` among matching documents, in
    /// ascending order. Documents without the field contribute nothing.
    pub async fn distinct(&self, field: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        let matching = self.collect_matching(filters).await?;
        let mut values: Vec<Value> = Vec::new();
        for doc in &matching {
            if let Some(value) = doc.field(field)
                && !values.iter().any(|seen| values_equal(seen, &value))
            {
                values.push(value.into_owned());
            }
        }
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        Ok(values)
    }

    async fn collect_matching(&self, filters: &[Filter]) -> Result<Vec<Document>> {
        let mut documents = self.all();
        let mut matching = Vec::new();
        let mut seen = HashSet::new();
        while let Some(doc) = documents.try_next().await? {
            if seen.insert(doc.id.clone()) && matches_filters(&doc, filters) {
                matching.push(doc);
            }
        }
        Ok(matching)
    }
}

/// Sorts by each key in order, falling back to the document id.
fn sort_documents(documents: &mut [Document], sort: &[(String, SortOrder)]) {
    documents.sort_by(|a, b| {
        sort.iter()
            .map(|&(ref field, order)| {
                let ordering = compare_values(a.field(field).as_deref(), b.field(field).as_deref());
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });
}
