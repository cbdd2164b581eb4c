//! `mport info`: show metadata for one installed package.

use crate::error::CliError;
use crate::ui;
use crate::Context;
use mport_store::Catalog;

/// Print one installed package's full metadata as a key/value table.
pub async fn run(ctx: &Context, package: &str) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let pkg = catalog
        .get_package(package)?
        .ok_or_else(|| CliError::NotFound(format!("{package}: not installed")))?;

    let depends = catalog.list_depends(pkg.name.as_str())?;
    let rows = vec![
        ("name".to_string(), pkg.name.to_string()),
        ("version".to_string(), pkg.version.to_string()),
        ("origin".to_string(), pkg.origin.clone()),
        ("prefix".to_string(), pkg.prefix.clone()),
        ("automatic".to_string(), pkg.automatic.to_string()),
        ("lock".to_string(), format!("{:?}", pkg.lock)),
        ("status".to_string(), format!("{:?}", pkg.status)),
        ("cpe".to_string(), pkg.cpe.clone().unwrap_or_else(|| "-".into())),
        ("categories".to_string(), pkg.categories.join(", ")),
        ("install_date".to_string(), pkg.install_date.clone()),
        ("flat_size".to_string(), pkg.flat_size.to_string()),
        (
            "depends".to_string(),
            depends
                .iter()
                .map(|d| format!("{}>={}", d.depend_name, d.depend_version))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ];
    ui::render_kv_table(pkg.name.as_str(), &rows);
    Ok(())
}
