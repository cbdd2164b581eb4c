//! `mport mirror list|select`: inspect and probe configured index mirrors.

use crate::error::CliError;
use crate::remote::select_mirror;
use crate::Context;
use mport_engine::Callbacks;
use mport_store::Catalog;

fn configured(catalog: &mport_store::Catalog) -> Result<Vec<String>, CliError> {
    Ok(catalog
        .get_setting("mirrors")?
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default())
}

/// Print every configured mirror URL.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let mirrors = configured(&catalog)?;
    if mirrors.is_empty() {
        return Err(CliError::Nothing("no mirrors configured".into()));
    }
    for mirror in mirrors {
        println!("{mirror}");
    }
    Ok(())
}

/// Ping every configured mirror and record the fastest responder.
pub async fn select(ctx: &Context) -> Result<(), CliError> {
    let mut catalog = Catalog::open(&ctx.paths.db_path())?;
    let mirrors = configured(&catalog)?;
    if mirrors.is_empty() {
        return Err(CliError::Nothing("no mirrors configured".into()));
    }
    let chosen = select_mirror(&mirrors, &ctx.client)
        .await
        .ok_or_else(|| CliError::Other("no mirror responded".into()))?;
    catalog.set_setting("selected_mirror", &chosen)?;
    ctx.callbacks.message(&format!("selected {chosen}"));
    Ok(())
}
