//! `mport audit`/`cpe`/`purl`: check installed packages with a known CPE
//! against a CVE feed.

use crate::error::CliError;
use crate::ui;
use crate::Context;
use mport_engine::Callbacks;
use mport_store::Catalog;

const DEFAULT_AUDIT_ENDPOINT: &str = "https://cve.mport.example/api/v1/advisories";

/// `recursive` widens a future dependency-closure audit; today every
/// installed package with a CPE is already checked regardless.
pub async fn run(ctx: &Context, _recursive: bool, package: Option<String>) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let mut reports = mport_engine::audit(&catalog, DEFAULT_AUDIT_ENDPOINT, &ctx.client, &ctx.callbacks).await?;

    if let Some(name) = &package {
        reports.retain(|r| r.package.as_str().eq_ignore_ascii_case(name));
        if reports.is_empty() {
            return Err(CliError::NotFound(format!("{name}: not installed or has no CPE")));
        }
    }

    let mut rows = Vec::new();
    for report in &reports {
        if let Some(warning) = &report.warning {
            rows.push((report.package.as_str().to_string(), "warn".to_string(), warning.to_string()));
            continue;
        }
        for advisory in &report.advisories {
            rows.push((
                report.package.as_str().to_string(),
                advisory.cve_id.clone().unwrap_or_else(|| "?".to_string()),
                advisory.description.clone().unwrap_or_default(),
            ));
        }
    }

    if rows.is_empty() {
        ctx.callbacks.message("no known vulnerabilities");
        return Ok(());
    }
    ui::render_package_table(&rows);
    Ok(())
}
