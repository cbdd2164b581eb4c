//! `mport import`/`export`: serialize the installed set to/from a file.
//!
//! This is metadata-only: `import` restores catalog rows so `list`/`info`
//! reflect a previous machine's installed set, it does not re-run any
//! install transaction or place files on disk.

use crate::error::CliError;
use crate::Context;
use mport_engine::Callbacks;
use mport_store::Catalog;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct ExportedPackage {
    package: mport_schema::Package,
    depends: Vec<mport_schema::Dependency>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportedSet {
    packages: Vec<ExportedPackage>,
}

/// Write every installed package's metadata (and dependency edges) to `file`.
pub async fn export(ctx: &Context, file: &Path) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let mut packages = Vec::new();
    for package in catalog.list_packages()? {
        let depends = catalog.list_depends(package.name.as_str())?;
        packages.push(ExportedPackage { package, depends });
    }
    let set = ExportedSet { packages };

    let bytes = postcard::to_allocvec(&set).map_err(|e| CliError::Other(e.to_string()))?;
    std::fs::write(file, bytes).map_err(CliError::Io)?;
    ctx.callbacks.message(&format!("exported {} package(s) to {}", set.packages.len(), file.display()));
    Ok(())
}

/// Restore catalog rows from a previously `export`ed file, skipping names already installed.
pub async fn import(ctx: &Context, file: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(file).map_err(CliError::Io)?;
    let set: ExportedSet = postcard::from_bytes(&bytes).map_err(|e| CliError::Other(e.to_string()))?;

    let mut catalog = Catalog::open(&ctx.paths.db_path())?;
    let mut restored = 0usize;
    for entry in &set.packages {
        if catalog.get_package(entry.package.name.as_str())?.is_some() {
            continue;
        }
        catalog.import_package(&entry.package, &entry.depends)?;
        restored += 1;
    }
    ctx.callbacks.message(&format!("restored {restored} package(s)"));
    Ok(())
}
