//! `mport search`: free-text search over the cached remote index.

use crate::error::CliError;
use crate::ui;
use crate::Context;

/// Free-text search the cached index by name or origin.
pub async fn run(ctx: &Context, query: &[String]) -> Result<(), CliError> {
    let index = ctx
        .load_index()
        .ok_or_else(|| CliError::Nothing("no index loaded; run `mport index` first".into()))?;

    let needle = query.join(" ").to_ascii_lowercase();
    let rows: Vec<(String, String, String)> = index
        .search(&needle)
        .into_iter()
        .map(|e| (e.name.to_string(), e.version.to_string(), e.origin.clone()))
        .collect();

    if rows.is_empty() {
        return Err(CliError::Nothing(format!("no matches for {needle:?}")));
    }
    ui::render_package_table(&rows);
    Ok(())
}
