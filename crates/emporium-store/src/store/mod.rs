/// Background metadata persistence and change broadcasting.
pub mod events;
/// Collection management operations.
pub mod operations;
/// Store implementation.
pub mod stor;

pub use stor::{Store, StoreConfig, StoreStats};
