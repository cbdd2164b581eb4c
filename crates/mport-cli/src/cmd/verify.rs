//! `mport verify`: recheck installed asset checksums against what's on disk.

use crate::error::CliError;
use crate::Context;
use mport_engine::Callbacks;
use mport_schema::{AssetKind, Sha256Digest};
use mport_store::Catalog;

/// Recheck installed asset checksums, optionally recomputing stored ones.
pub async fn run(ctx: &Context, recompute: bool, packages: &[String]) -> Result<(), CliError> {
    let mut catalog = Catalog::open(&ctx.paths.db_path())?;
    let all = catalog.list_packages()?;
    let targets: Vec<_> = if packages.is_empty() {
        all
    } else {
        all.into_iter()
            .filter(|p| packages.iter().any(|n| n.eq_ignore_ascii_case(p.name.as_str())))
            .collect()
    };

    let mut mismatches = 0usize;
    for pkg in &targets {
        let assets = catalog.list_assets(pkg.name.as_str())?;
        for asset in assets {
            if !asset.kind.produces_file() {
                continue;
            }
            let Some(expected) = &asset.checksum else { continue };
            // Stored as an absolute, root-stripped path.
            let path = ctx.paths.resolve(&asset.data);
            let actual = match std::fs::read(&path) {
                Ok(bytes) => Sha256Digest::compute(&bytes).as_str().to_string(),
                Err(_) => {
                    println!("{}: {} missing", pkg.name, asset.data);
                    mismatches += 1;
                    continue;
                }
            };
            if &actual != expected {
                println!("{}: {} checksum mismatch", pkg.name, asset.data);
                mismatches += 1;
                if recompute {
                    catalog
                        .raw()
                        .execute(
                            "UPDATE assets SET checksum = ?1 WHERE pkg = ?2 AND kind = ?3 AND data = ?4",
                            (&actual, pkg.name.as_str(), kind_str(asset.kind), &asset.data),
                        )
                        .map_err(mport_store::StoreError::from)?;
                }
            }
        }
    }

    if mismatches == 0 {
        ctx.callbacks.message("all checksums verified");
    }
    Ok(())
}

fn kind_str(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Cwd => "cwd",
        AssetKind::Chmod => "chmod",
        AssetKind::Chown => "chown",
        AssetKind::Chgrp => "chgrp",
        AssetKind::File => "file",
        AssetKind::Sample => "sample",
        AssetKind::Shell => "shell",
        AssetKind::Info => "info",
        AssetKind::Touch => "touch",
        AssetKind::Directory => "directory",
        AssetKind::DirectoryRemove => "directory-remove",
        AssetKind::DirectoryRemoveTry => "directory-remove-try",
        AssetKind::PreExec => "pre-exec",
        AssetKind::PostExec => "post-exec",
        AssetKind::Ldconfig => "ldconfig",
        AssetKind::LdconfigLinux => "ldconfig-linux",
        AssetKind::GlibSchemas => "glib-schemas",
        AssetKind::Kld => "kld",
        AssetKind::DesktopDb => "desktop-db",
    }
}
