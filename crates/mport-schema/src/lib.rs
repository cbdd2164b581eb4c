//! Shared domain types, version algebra, and asset model for mport.
//!
//! This crate has no I/O of its own: it defines the vocabulary the catalog
//! store, bundle reader, and engines all speak.

/// Closed set of plist-directive asset kinds and phase filtering.
pub mod asset;
/// Typed checksum wrapper.
pub mod hash;
/// Package, dependency, conflict, moved, and log-entry domain types.
pub mod package;
/// Version parsing, ordering, and range-predicate matching.
pub mod version;

pub use asset::{Asset, AssetKind, Phase};
pub use hash::{ChecksumError, Sha256Digest};
pub use package::{Conflict, Dependency, IndexEntry, Lock, LogEntry, Moved, Package, PackageName, Status};
pub use version::{require_check, Version, VersionCheck, VersionError};
