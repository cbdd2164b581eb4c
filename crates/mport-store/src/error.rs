//! Catalog store errors.

/// Errors surfaced by the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying SQLite connection returned an error.
    #[error("catalog database error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A row referenced a package name not present in `packages`.
    #[error("no such package: {0}")]
    NoSuchPackage(String),

    /// A checksum or version string stored in the catalog failed to parse.
    #[error("corrupt catalog row for {package}: {detail}")]
    CorruptRow {
        /// The package the bad row belongs to.
        package: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The stub database could not be attached.
    #[error("failed to attach stub database at {path}: {source}")]
    StubAttach {
        /// Path to the stub database.
        path: String,
        /// Underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
}
