//! `mport add`: install one or more local bundle files.

use crate::error::CliError;
use crate::Context;
use mport_engine::{install_one, Callbacks, InstallOptions};
use mport_store::Catalog;
use std::path::{Path, PathBuf};

/// Stage and install every file in `files`, in argument order.
pub async fn run(ctx: &Context, files: &[PathBuf], automatic: bool, force: bool) -> Result<(), CliError> {
    ctx.paths.ensure_dirs().map_err(CliError::Io)?;
    for file in files {
        add_one(ctx, file, automatic, force).await?;
    }
    Ok(())
}

async fn add_one(ctx: &Context, file: &Path, automatic: bool, force: bool) -> Result<(), CliError> {
    let file = file.to_path_buf();
    let paths = ctx.paths.clone();
    let callbacks = ctx.callbacks.clone();

    tokio::task::spawn_blocking(move || install_from_file(&paths, &file, automatic, force, &callbacks))
        .await
        .map_err(|e| CliError::Other(e.to_string()))?
}

fn install_from_file(
    paths: &mport_engine::Paths,
    file: &Path,
    automatic: bool,
    force: bool,
    callbacks: &std::sync::Arc<dyn Callbacks>,
) -> Result<(), CliError> {
    let mut catalog = Catalog::open(&paths.db_path())?;
    let bundle = mport_bundle::StagedBundle::stage(file)?;
    install_one(&mut catalog, paths, &bundle, InstallOptions { automatic, force }, callbacks)?;
    Ok(())
}
