//! `mport delete`: remove installed packages, respecting locks.

use crate::error::CliError;
use crate::Context;
use mport_engine::DeleteOptions;
use mport_schema::Lock;
use mport_store::Catalog;

/// Remove every name in `packages`, in argument order.
pub async fn run(ctx: &Context, packages: &[String], force: bool) -> Result<(), CliError> {
    for name in packages {
        delete_one(ctx, name, force).await?;
    }
    Ok(())
}

async fn delete_one(ctx: &Context, name: &str, force: bool) -> Result<(), CliError> {
    let name = name.to_string();
    let paths = ctx.paths.clone();
    let callbacks = ctx.callbacks.clone();

    tokio::task::spawn_blocking(move || -> Result<(), CliError> {
        let mut catalog = Catalog::open(&paths.db_path())?;
        let pkg = catalog
            .get_package(&name)?
            .ok_or_else(|| CliError::NotFound(format!("{name}: not installed")))?;
        if pkg.lock == Lock::Locked && !force {
            return Err(CliError::Nothing(format!("{name} is locked; use --force to override")));
        }
        mport_engine::delete_one(&mut catalog, &paths, &name, DeleteOptions { force }, &callbacks)?;
        Ok(())
    })
    .await
    .map_err(|e| CliError::Other(e.to_string()))?
}
