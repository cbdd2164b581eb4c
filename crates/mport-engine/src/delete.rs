//! Delete Engine: walks a package's recorded assets in reverse order,
//! undoing what install did.

use crate::callbacks::Callbacks;
use crate::error::EngineError;
use crate::message;
use crate::paths::Paths;
use mport_schema::{AssetKind, PackageName};
use mport_store::Catalog;
use std::path::PathBuf;
use std::sync::Arc;

/// Options controlling one delete operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Keep going past non-fatal errors (e.g. a non-empty `directory-remove`).
    pub force: bool,
}

/// Uninstall `name`: run the deinstall hook, remove files/directories in
/// reverse bundle order, then drop the catalog rows.
#[tracing::instrument(skip(catalog, callbacks))]
pub fn delete_one(
    catalog: &mut Catalog,
    paths: &Paths,
    name: &str,
    options: DeleteOptions,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    let pkg = catalog
        .get_package(name)?
        .ok_or_else(|| EngineError::fatal("delete", Some(PackageName::new(name)), not_installed(name)))?;

    callbacks.message(&format!("removing {} {}", pkg.name, pkg.version));

    if let Ok(contents) = std::fs::read_to_string(
        paths.infra_dir(pkg.name.as_str(), pkg.version.as_str()).join("pkg-message"),
    ) {
        let entries = message::parse(&contents);
        for entry in message::applicable(&entries, Some(&pkg.version), message::MessageType::Remove) {
            callbacks.message(&entry.message);
        }
    }

    run_deinstall_hook(paths, &pkg.name, pkg.version.as_str(), "DEINSTALL")?;

    let assets = catalog.list_assets(name)?;
    let mut cwd = paths.resolve(&pkg.prefix);

    for asset in assets.iter().rev() {
        match asset.kind {
            AssetKind::Cwd => cwd = paths.resolve(&asset.data),
            AssetKind::File | AssetKind::Shell | AssetKind::Info | AssetKind::Sample => {
                // Stored as an absolute, root-stripped path; resolve against
                // the chroot root directly rather than the ambient cwd.
                remove_file_best_effort(&paths.resolve(&asset.data));
            }
            AssetKind::Touch => {
                remove_file_best_effort(&cwd.join(&asset.data));
            }
            AssetKind::Directory | AssetKind::DirectoryRemoveTry => {
                remove_dir_best_effort(&cwd.join(&asset.data));
            }
            AssetKind::DirectoryRemove => {
                remove_dir_strict(&cwd.join(&asset.data), options.force)?;
            }
            _ => {}
        }
    }

    std::fs::remove_dir_all(paths.infra_dir(pkg.name.as_str(), pkg.version.as_str())).ok();

    catalog.delete_package(&pkg.name)?;
    callbacks.message(&format!("removed {} {}", pkg.name, pkg.version));
    Ok(())
}

fn not_installed(name: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotFound, format!("{name} is not installed"))
}

fn run_deinstall_hook(paths: &Paths, name: &PackageName, version: &str, phase: &str) -> Result<(), EngineError> {
    let script = paths.infra_dir(name.as_str(), version).join("pkg-deinstall");
    if !script.exists() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o750));
    }
    let status = std::process::Command::new(&script)
        .arg(name.as_str())
        .arg(phase)
        .status()
        .map_err(|e| EngineError::fatal("delete", Some(name.clone()), e))?;
    if !status.success() {
        return Err(EngineError::fatal(
            "delete",
            Some(name.clone()),
            std::io::Error::other(format!("{phase} hook exited with {status}")),
        ));
    }
    Ok(())
}

fn remove_file_best_effort(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
}

fn remove_dir_best_effort(path: &PathBuf) {
    let _ = std::fs::remove_dir(path);
}

fn remove_dir_strict(path: &PathBuf, force: bool) -> Result<(), EngineError> {
    match std::fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(_) if force => Ok(()),
        Err(e) => Err(EngineError::warn("delete", None, e)),
    }
}
