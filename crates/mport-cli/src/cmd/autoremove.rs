//! `mport autoremove`: sweep orphaned automatic packages to a fixed point.

use crate::error::CliError;
use crate::Context;
use mport_store::Catalog;

/// Sweep to a fixed point and report how many packages were removed.
pub async fn run(ctx: &Context) -> Result<(), CliError> {
    let paths = ctx.paths.clone();
    let callbacks = ctx.callbacks.clone();

    tokio::task::spawn_blocking(move || -> Result<(), CliError> {
        let mut catalog = Catalog::open(&paths.db_path())?;
        let report = mport_engine::autoremove(&mut catalog, &paths, &callbacks)?;
        if report.removed.is_empty() {
            return Err(CliError::Nothing("nothing to autoremove".into()));
        }
        Ok(())
    })
    .await
    .map_err(|e| CliError::Other(e.to_string()))?
}
