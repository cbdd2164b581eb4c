//! `mport install`: resolve package names against the index, download, and
//! install each bundle.

use crate::download::download_and_verify;
use crate::error::CliError;
use crate::Context;
use mport_engine::{Callbacks, InstallOptions};

/// Resolve, download, and install every name in `packages`.
pub async fn run(ctx: &Context, packages: &[String], automatic: bool, force: bool) -> Result<(), CliError> {
    let index = ctx
        .load_index()
        .ok_or_else(|| CliError::Nothing("no index loaded; run `mport index` first".into()))?;

    ctx.paths.ensure_dirs().map_err(CliError::Io)?;

    for name in packages {
        let entry = index
            .find(name)
            .ok_or_else(|| CliError::NotFound(format!("{name}: not found in index")))?;

        ctx.callbacks.message(&format!("fetching {} {}", entry.name, entry.version));
        let dest = ctx.paths.cache_dir().join(format!("{}-{}.bundle", entry.name, entry.version));
        download_and_verify(&ctx.client, &entry.url, &dest, &entry.sha256).await?;

        let paths = ctx.paths.clone();
        let callbacks = ctx.callbacks.clone();
        let options = InstallOptions { automatic, force };
        tokio::task::spawn_blocking(move || -> Result<(), CliError> {
            let mut catalog = mport_store::Catalog::open(&paths.db_path())?;
            let bundle = mport_bundle::StagedBundle::stage(&dest)?;
            mport_engine::install_one(&mut catalog, &paths, &bundle, options, &callbacks)?;
            Ok(())
        })
        .await
        .map_err(|e| CliError::Other(e.to_string()))??;
    }
    Ok(())
}
