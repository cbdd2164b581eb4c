//! `mport cpe`/`mport purl`: print identifiers for installed packages.

use crate::error::CliError;
use crate::Context;
use mport_store::Catalog;

/// Print `name\tcpe` for one or every installed package.
pub async fn cpe(ctx: &Context, package: Option<String>) -> Result<(), CliError> {
    for pkg in selected(ctx, package)? {
        match pkg.cpe {
            Some(cpe) => println!("{}\t{cpe}", pkg.name),
            None => println!("{}\t-", pkg.name),
        }
    }
    Ok(())
}

/// Print a `pkg:generic/name@version` purl for one or every installed package.
pub async fn purl(ctx: &Context, package: Option<String>) -> Result<(), CliError> {
    for pkg in selected(ctx, package)? {
        println!("pkg:generic/{}@{}", pkg.name, pkg.version);
    }
    Ok(())
}

fn selected(ctx: &Context, package: Option<String>) -> Result<Vec<mport_schema::Package>, CliError> {
    let catalog = Catalog::open(&ctx.paths.db_path())?;
    let all = catalog.list_packages()?;
    match package {
        Some(name) => {
            let pkg = all
                .into_iter()
                .find(|p| p.name.as_str().eq_ignore_ascii_case(&name))
                .ok_or_else(|| CliError::NotFound(format!("{name}: not installed")))?;
            Ok(vec![pkg])
        }
        None => Ok(all),
    }
}
