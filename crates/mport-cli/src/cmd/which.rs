//! `mport which`: reverse-lookup the installed package that owns a file.

use crate::error::CliError;
use crate::Context;
use mport_store::Catalog;
use std::path::Path;

/// Reverse-lookup the installed package that owns `path`.
pub async fn run(ctx: &Context, path: &Path, quiet: bool, origin: bool) -> Result<(), CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let target = path.to_string_lossy();

    for pkg in catalog.list_packages()? {
        let assets = catalog.list_assets(pkg.name.as_str())?;
        let owns = assets.iter().any(|a| a.kind.produces_file() && a.data == target);
        if !owns {
            continue;
        }
        if quiet {
            return Ok(());
        }
        if origin {
            println!("{}", pkg.origin);
        } else {
            println!("{} is owned by {}-{}", target, pkg.name, pkg.version);
        }
        return Ok(());
    }

    if quiet {
        return Err(CliError::Nothing(String::new()));
    }
    Err(CliError::NotFound(format!("{target}: not owned by any installed package")))
}
