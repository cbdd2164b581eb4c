//! The relational catalog store: the single source of truth for what is
//! installed, at what version, with what dependencies, owning which files.

/// The exclusive-writer actor wrapping a [`Catalog`] for async callers.
pub mod actor;
/// The synchronous catalog connection engines operate on directly.
pub mod catalog;
/// Store error type.
pub mod error;
/// Schema DDL and the `version_cmp` SQL function.
pub mod schema;

pub use actor::CatalogHandle;
pub use catalog::Catalog;
pub use error::StoreError;
