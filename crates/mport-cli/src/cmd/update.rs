//! `mport update`: replace named installed packages with their latest index
//! version directly, without walking their dependents (unlike `upgrade`).

use crate::cmd::upgrade::IndexUpgradeSource;
use crate::error::CliError;
use crate::Context;
use mport_engine::{DeleteOptions, UpgradeSource};
use mport_schema::Lock;
use mport_store::Catalog;

/// Replace each of `packages` with its latest index version.
pub async fn run(ctx: &Context, packages: &[String]) -> Result<(), CliError> {
    let index = ctx
        .load_index()
        .ok_or_else(|| CliError::Nothing("no index loaded; run `mport index` first".into()))?;

    let paths = ctx.paths.clone();
    let callbacks = ctx.callbacks.clone();
    let packages = packages.to_vec();

    tokio::task::spawn_blocking(move || -> Result<(), CliError> {
        let mut catalog = Catalog::open(&paths.db_path())?;
        let source = IndexUpgradeSource::new(index, paths.clone());
        let mut replaced = 0usize;

        for name in &packages {
            let Some(installed) = catalog.get_package(name)? else {
                return Err(CliError::NotFound(format!("{name}: not installed")));
            };
            if installed.lock == Lock::Locked {
                callbacks.message(&format!("{name} is locked, skipping update"));
                continue;
            }
            let Some(latest) = source.latest_version(name) else {
                continue;
            };
            if latest <= installed.version {
                continue;
            }
            mport_engine::delete_one(&mut catalog, &paths, name, DeleteOptions { force: true }, &callbacks)?;
            source.install(&mut catalog, name, installed.automatic)?;
            replaced += 1;
        }

        if replaced == 0 {
            return Err(CliError::Nothing("nothing to update".into()));
        }
        Ok(())
    })
    .await
    .map_err(|e| CliError::Other(e.to_string()))?
}
