//! Bundle reader errors.

/// Errors surfaced while staging or reading a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Unpacking the archive failed.
    #[error("failed to unpack bundle archive: {0}")]
    Unpack(#[from] std::io::Error),

    /// The stub database could not be read.
    #[error("stub database error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The bundle's stub database had no `packages` row, or more than one.
    #[error("bundle does not describe exactly one package (found {0})")]
    NotSinglePackage(usize),

    /// The bundle's infra directory was missing an expected lifecycle file.
    #[error("missing infra file: {0}")]
    MissingInfraFile(String),
}
