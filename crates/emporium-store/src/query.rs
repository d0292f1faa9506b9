use serde_json::Value;

use crate::Document;

/// Represents a query for filtering documents in a collection.
///
/// A query consists of filters (all of which must match), sort keys, a limit,
/// an offset and an optional projection. Results are always ordered
/// deterministically: after the explicit sort keys the document id breaks ties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Filters that must all match
    pub filters:    Vec<Filter>,
    /// Sort keys, applied in order
    pub sort:       Vec<(String, SortOrder)>,
    /// Maximum number of results
    pub limit:      Option<usize>,
    /// Number of results to skip
    pub offset:     Option<usize>,
    /// Fields to include in results (projection)
    pub projection: Option<Vec<String>>,
}

/// The result of executing a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The documents of the requested page
    pub documents:      Vec<Document>,
    /// Total number of documents that matched (before limit/offset)
    pub total_count:    usize,
    /// Time taken to execute the query
    pub execution_time: std::time::Duration,
}

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order
    Ascending,
    /// Descending order
    Descending,
}

/// A filter condition for querying documents.
///
/// Field names are dotted paths or one of the `$` pseudo-fields described on
/// [`Document::field`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// field == value (a missing field equals `null`)
    Equals(String, Value),
    /// field != value
    NotEquals(String, Value),
    /// field > value
    GreaterThan(String, Value),
    /// field < value
    LessThan(String, Value),
    /// field >= value
    GreaterOrEqual(String, Value),
    /// field <= value
    LessOrEqual(String, Value),
    /// String field contains the substring, or an array field holds a string containing it
    Contains(String, String),
    /// Like `Contains`, ignoring case
    ContainsInsensitive(String, String),
    /// String field starts with the prefix
    StartsWith(String, String),
    /// String field ends with the suffix
    EndsWith(String, String),
    /// Field value is one of the listed values
    In(String, Vec<Value>),
    /// Field exists (or doesn't exist if false)
    Exists(String, bool),
    /// All of the inner filters match
    And(Vec<Self>),
    /// At least one of the inner filters matches
    Or(Vec<Self>),
    /// The inner filter does not match
    Not(Box<Self>),
}

/// Operator for building filters in the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality
    Equals,
    /// Inequality
    NotEquals,
    /// Greater than
    GreaterThan,
    /// Less than
    LessThan,
    /// Greater or equal
    GreaterOrEqual,
    /// Less or equal
    LessOrEqual,
    /// Contains substring
    Contains,
    /// Contains substring, ignoring case
    ContainsInsensitive,
    /// Starts with prefix
    StartsWith,
    /// Ends with suffix
    EndsWith,
    /// Value in list
    In,
    /// Field exists
    Exists,
}

/// Aggregations computed over the documents matching a set of filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Number of matching documents
    Count,
    /// Sum of the numeric values of a field
    Sum(String),
    /// Mean of the numeric values of a field, `null` when there are none
    Avg(String),
    /// Smallest numeric value of a field, `null` when there are none
    Min(String),
    /// Largest numeric value of a field, `null` when there are none
    Max(String),
}

/// Builder pattern for constructing queries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new empty query builder.
    pub fn new() -> Self { Self::default() }

    /// Adds a filter condition to the query.
    ///
    /// String operators ignore non-string values, `In` ignores non-array
    /// values; such calls leave the builder unchanged. `Exists` reads the value
    /// as a boolean and treats anything else as `true`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use emporium_store::{Operator, QueryBuilder};
    /// use serde_json::json;
    ///
    /// let query = QueryBuilder::new()
    ///     .filter("stock", Operator::GreaterThan, json!(0))
    ///     .filter("category", Operator::Equals, json!("lamps"))
    ///     .build();
    /// assert_eq!(query.filters.len(), 2);
    /// ```
    pub fn filter(mut self, field: &str, op: Operator, value: Value) -> Self {
        let field = field.to_owned();
        let filter = match (op, value) {
            (Operator::Equals, value) => Filter::Equals(field, value),
            (Operator::NotEquals, value) => Filter::NotEquals(field, value),
            (Operator::GreaterThan, value) => Filter::GreaterThan(field, value),
            (Operator::LessThan, value) => Filter::LessThan(field, value),
            (Operator::GreaterOrEqual, value) => Filter::GreaterOrEqual(field, value),
            (Operator::LessOrEqual, value) => Filter::LessOrEqual(field, value),
            (Operator::Contains, Value::String(s)) => Filter::Contains(field, s),
            (Operator::ContainsInsensitive, Value::String(s)) => Filter::ContainsInsensitive(field, s),
            (Operator::StartsWith, Value::String(s)) => Filter::StartsWith(field, s),
            (Operator::EndsWith, Value::String(s)) => Filter::EndsWith(field, s),
            (Operator::In, Value::Array(values)) => Filter::In(field, values),
            (Operator::Exists, value) => Filter::Exists(field, value.as_bool().unwrap_or(true)),
            (Operator::Contains | Operator::ContainsInsensitive | Operator::StartsWith | Operator::EndsWith | Operator::In, _) => {
                return self;
            },
        };
        self.query.filters.push(filter);
        self
    }

    /// Adds an already constructed filter.
    pub fn where_filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    /// Combines the last filter with `other` using AND.
    pub fn and(mut self, other: Filter) -> Self {
        let combined = match self.query.filters.pop() {
            Some(last) => Filter::And(vec![last, other]),
            None => other,
        };
        self.query.filters.push(combined);
        self
    }

    /// Combines the last filter with `other` using OR.
    pub fn or(mut self, other: Filter) -> Self {
        let combined = match self.query.filters.pop() {
            Some(last) => Filter::Or(vec![last, other]),
            None => other,
        };
        self.query.filters.push(combined);
        self
    }

    /// Appends a sort key. Keys apply in the order they were added.
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.query.sort.push((field.to_owned(), order));
        self
    }

    /// Sets the maximum number of results to return.
    pub const fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of results to skip.
    pub const fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Restricts returned documents to the given fields.
    pub fn projection(mut self, fields: Vec<&str>) -> Self {
        self.query.projection = Some(fields.into_iter().map(str::to_owned).collect());
        self
    }

    /// Builds the query from the current builder state.
    pub fn build(self) -> Query { self.query }
}
