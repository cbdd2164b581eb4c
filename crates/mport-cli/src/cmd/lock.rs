//! `mport lock`/`unlock`/`locks`: pin packages against upgrade/autoremove.

use crate::error::CliError;
use crate::Context;
use mport_schema::Lock;
use mport_store::Catalog;

/// Pin a package against upgrade and autoremove.
pub async fn lock(ctx: &Context, package: &str) -> Result<(), CliError> {
    set(ctx, package, Lock::Locked).await
}

/// Unpin a package.
pub async fn unlock(ctx: &Context, package: &str) -> Result<(), CliError> {
    set(ctx, package, Lock::Unlocked).await
}

async fn set(ctx: &Context, package: &str, lock: Lock) -> Result<(), CliError> {
    let mut catalog = Catalog::open(&ctx.paths.db_path())?;
    catalog
        .get_package(package)?
        .ok_or_else(|| CliError::NotFound(format!("{package}: not installed")))?;
    catalog.set_lock(package, lock)?;
    Ok(())
}

/// List every currently locked package.
pub async fn locks(ctx: &Context) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let locked = catalog.list_locked()?;
    if locked.is_empty() {
        return Err(CliError::Nothing("no locked packages".into()));
    }
    for name in locked {
        println!("{name}");
    }
    Ok(())
}
