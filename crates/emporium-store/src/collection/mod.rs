/// Collection aggregation operations.
pub mod aggregation;
/// Core collection implementation.
pub mod coll;
/// Collection write and point-read operations.
pub mod operations;
/// Collection query operations.
pub mod query;
/// Collection streaming operations.
pub mod streaming;
/// Collection verification operations.
pub mod verification;

pub use coll::*;
