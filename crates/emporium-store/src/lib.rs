//! Filesystem-backed JSON document store.
//!
//! A [`Store`] is a directory holding named [`Collection`]s; every document is
//! one pretty-printed JSON file carrying its version, timestamps and a BLAKE3
//! hash of its data. Writes are atomic renames serialised per collection, and
//! queries are evaluated in memory over a directory scan.

pub mod collection;
pub mod comparison;
pub mod constants;
pub mod document;
pub mod error;
pub mod events;
pub mod filtering;
pub mod fsutil;
pub mod locks;
pub mod metadata;
pub mod options;
pub mod projection;
pub mod query;
pub mod store;
pub mod streaming;
pub mod validation;
pub mod verification;

pub use collection::Collection;
pub use document::Document;
pub use error::{Result, StoreError};
pub use events::StoreEvent;
pub use locks::KeyedLocks;
pub use metadata::StoreMetadata;
pub use options::{CollectionOptions, UniqueIndex};
pub use query::{Aggregation, Filter, Operator, Query, QueryBuilder, QueryResult, SortOrder};
pub use store::{Store, StoreConfig, StoreStats};
pub use streaming::BoxStream;
pub use verification::VerificationMode;
