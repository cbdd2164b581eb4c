//! `mport list [updates|prime]`: enumerate installed packages.

use crate::error::CliError;
use crate::ui;
use crate::{Context, ListMode};
use mport_store::Catalog;

/// Enumerate installed packages, optionally restricted to `updates` or `prime`.
pub async fn run(ctx: &Context, mode: Option<ListMode>) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let packages = catalog.list_packages()?;

    let rows: Vec<(String, String, String)> = match mode {
        None => packages
            .into_iter()
            .map(|p| (p.name.to_string(), p.version.to_string(), p.origin))
            .collect(),
        Some(ListMode::Prime) => packages
            .into_iter()
            .filter(|p| !p.automatic)
            .map(|p| (p.name.to_string(), p.version.to_string(), p.origin))
            .collect(),
        Some(ListMode::Updates) => {
            let index = ctx
                .load_index()
                .ok_or_else(|| CliError::Nothing("no index loaded; run `mport index` first".into()))?;
            packages
                .into_iter()
                .filter_map(|p| {
                    let entry = index.find(p.name.as_str())?;
                    if entry.version > p.version {
                        Some((p.name.to_string(), p.version.to_string(), entry.version.to_string()))
                    } else {
                        None
                    }
                })
                .collect()
        }
    };

    if rows.is_empty() {
        return Err(CliError::Nothing("nothing to list".into()));
    }
    ui::render_package_table(&rows);
    Ok(())
}
