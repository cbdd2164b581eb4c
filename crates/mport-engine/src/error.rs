//! The one typed error crossing the engine/CLI boundary.
//!
//! No process-global "last error" slot exists anywhere in this crate —
//! every fallible operation returns a `Result` carrying its own cause.

use mport_schema::PackageName;
use std::fmt;

/// Severity of an engine error: fatal, warn, or informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Aborts the whole operation; any in-flight transaction is rolled back.
    Fatal,
    /// Logged and surfaced, but the batch operation continues with the next item.
    Warn,
}

/// An engine-level error: which operation, on which package (if any), with
/// what underlying cause.
#[derive(Debug)]
pub struct EngineError {
    /// Severity.
    pub severity: Severity,
    /// The operation being performed (e.g. `"install"`, `"upgrade"`).
    pub operation: &'static str,
    /// The package involved, if the error is package-scoped.
    pub package: Option<PackageName>,
    /// The underlying cause.
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl EngineError {
    /// Build a fatal error.
    pub fn fatal(
        operation: &'static str,
        package: Option<PackageName>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            severity: Severity::Fatal,
            operation,
            package,
            source: Box::new(source),
        }
    }

    /// Build a warning-level error.
    pub fn warn(
        operation: &'static str,
        package: Option<PackageName>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            severity: Severity::Warn,
            operation,
            package,
            source: Box::new(source),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "{}: {pkg}: {}", self.operation, self.source),
            None => write!(f, "{}: {}", self.operation, self.source),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<mport_store::StoreError> for EngineError {
    fn from(err: mport_store::StoreError) -> Self {
        Self::fatal("catalog", None, err)
    }
}

impl From<mport_bundle::BundleError> for EngineError {
    fn from(err: mport_bundle::BundleError) -> Self {
        Self::fatal("bundle", None, err)
    }
}
