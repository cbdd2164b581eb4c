//! `mport index`: refresh the local copy of the remote index.

use crate::error::CliError;
use crate::remote::{select_mirror, Index};
use crate::Context;
use mport_engine::Callbacks;
use mport_store::Catalog;

const DEFAULT_INDEX_URL: &str = "https://index.mport.example/index.postcard.zst";

/// Refresh the cached index from the configured mirrors or index URL.
pub async fn run(ctx: &Context) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let configured_mirrors: Vec<String> = catalog
        .get_setting("mirrors")?
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default();

    let url = if configured_mirrors.is_empty() {
        catalog.get_setting("index_url")?.unwrap_or_else(|| DEFAULT_INDEX_URL.to_string())
    } else {
        select_mirror(&configured_mirrors, &ctx.client)
            .await
            .ok_or_else(|| CliError::Other("no mirror responded".into()))?
    };

    ctx.paths.ensure_dirs().map_err(CliError::Io)?;
    let index = Index::fetch(&url, &ctx.client).await?;
    index.save(&ctx.index_cache_path())?;
    ctx.callbacks.message(&format!("fetched {} package(s)", index.entries.len()));
    Ok(())
}
