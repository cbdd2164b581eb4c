//! `mport config`: read or write the catalog's settings table.

use crate::error::CliError;
use crate::Context;
use mport_store::Catalog;

/// Print every setting as `key\tvalue`.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    for (key, value) in catalog.list_settings()? {
        println!("{key}\t{value}");
    }
    Ok(())
}

/// Print one setting's value.
pub async fn get(ctx: &Context, key: &str) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    match catalog.get_setting(key)? {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Err(CliError::NotFound(format!("{key}: no such setting"))),
    }
}

/// Write one setting's value.
pub async fn set(ctx: &Context, key: &str, value: &str) -> Result<(), CliError> {
    let mut catalog = Catalog::open(&ctx.paths.db_path())?;
    catalog.set_setting(key, value)?;
    Ok(())
}
