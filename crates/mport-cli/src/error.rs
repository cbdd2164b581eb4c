//! The CLI-boundary error type. Internal crates return typed errors
//! (`EngineError`, `StoreError`, `BundleError`); this is where they funnel
//! into one thing the exit-code mapping in `main` can read, mirroring the
//! teacher's `anyhow`-at-the-edge convention.

use mport_engine::{EngineError, Severity};
use thiserror::Error;

/// Errors surfaced at the CLI boundary.
#[derive(Error, Debug)]
pub enum CliError {
    /// An engine operation failed; carries the severity for exit-code mapping.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Catalog store failure outside of an engine call (e.g. a plain query).
    #[error("{0}")]
    Store(#[from] mport_store::StoreError),

    /// Bundle staging/reading failure.
    #[error("{0}")]
    Bundle(#[from] mport_bundle::BundleError),

    /// A network request failed.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(std::io::Error),

    /// Nothing matched the user's request (e.g. an unknown package name).
    #[error("{0}")]
    NotFound(String),

    /// The user declined a confirmation, or there was nothing to do.
    #[error("{0}")]
    Nothing(String),

    /// Anything else, already rendered to text.
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// The process exit code this error should produce: `1` fatal, `2`
    /// warn/nothing-to-do/declined.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(e) if e.severity == Severity::Warn => 2,
            CliError::Nothing(_) => 2,
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err.to_string())
    }
}
