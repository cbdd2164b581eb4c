//! Core domain types shared by the catalog store, bundle reader, and engines.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A normalized package name: case-preserved for display, compared
/// case-insensitively.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Wrap a package name string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for PackageName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.to_ascii_lowercase().cmp(&other.0.to_ascii_lowercase())
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Lock state of an installed package: a locked package is skipped by
/// `upgrade` and `autoremove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lock {
    /// Normal: eligible for upgrade/autoremove.
    Unlocked,
    /// Explicitly pinned by the user via `mport lock`.
    Locked,
}

/// Install-transaction status of a catalog row.
///
/// A `Dirty` row indicates the install transaction that created it never
/// reached its final commit — the install was interrupted mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Install completed and was marked clean as the last act of Phase C.
    Clean,
    /// Install is in progress, or was interrupted before completion.
    Dirty,
}

/// A fully installed package row, as recorded in the catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package name.
    pub name: PackageName,
    /// Installed version.
    pub version: Version,
    /// Upstream origin identifier (vendor/port path).
    pub origin: String,
    /// Filesystem prefix the package was installed under.
    pub prefix: String,
    /// `true` if this package was pulled in only as someone else's
    /// dependency (eligible for autoremove once nothing depends on it).
    pub automatic: bool,
    /// Lock state.
    pub lock: Lock,
    /// Install transaction status.
    pub status: Status,
    /// The OS this package was built for (e.g. `linux`, `freebsd`), if the
    /// bundle declared one. `None` means no OS restriction.
    pub os_release: Option<String>,
    /// CPE identifier, if known.
    pub cpe: Option<String>,
    /// Categories this package belongs to.
    pub categories: Vec<String>,
    /// ISO-8601 install timestamp.
    pub install_date: String,
    /// Sum of installed file sizes, in bytes.
    pub flat_size: u64,
}

/// A dependency edge: `pkg` requires `depend_name` at `depend_version` (or newer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// The dependent package.
    pub pkg: PackageName,
    /// The required package.
    pub depend_name: PackageName,
    /// The minimum required version.
    pub depend_version: Version,
    /// The required package's origin, for disambiguation.
    pub depend_origin: String,
}

/// A conflict edge: `pkg` cannot coexist with `conflict_name` at or above
/// `conflict_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// The package declaring the conflict.
    pub pkg: PackageName,
    /// The package it conflicts with.
    pub conflict_name: PackageName,
    /// The version threshold at which the conflict applies.
    pub conflict_version: Version,
}

/// A historical rename/merge record: `from` has moved to `to` as of `date`,
/// with `reason` shown to the user before migrating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moved {
    /// The old package name.
    pub from: PackageName,
    /// The new package name (empty if the package was simply removed).
    pub to: Option<PackageName>,
    /// ISO-8601 date the move took effect.
    pub date: String,
    /// Human-readable explanation.
    pub reason: String,
}

/// A single catalog-store audit-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Affected package.
    pub pkg: PackageName,
    /// Package version at the time of the event.
    pub version: Version,
    /// ISO-8601 timestamp.
    pub instant: String,
    /// Human-readable message (e.g. "installed", "upgraded from 1.0").
    pub message: String,
}

/// A remote index entry describing an available package version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Package name.
    pub name: PackageName,
    /// Available version.
    pub version: Version,
    /// Upstream origin identifier.
    pub origin: String,
    /// Bundle download URL.
    pub url: String,
    /// SHA-256 digest of the bundle, hex-encoded.
    pub sha256: String,
    /// Declared dependencies (name, minimum version).
    pub depends: Vec<(PackageName, Version)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names_compare_case_insensitively() {
        assert_eq!(PackageName::new("Zsh"), PackageName::new("zsh"));
    }

    #[test]
    fn package_name_borrows_as_str_for_hashset_lookup() {
        use std::collections::HashSet;
        let mut set: HashSet<PackageName> = HashSet::new();
        set.insert(PackageName::new("bash"));
        assert!(set.contains("bash"));
    }
}
