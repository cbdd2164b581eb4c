//! Install Engine: the three-phase transactional installer.
//!
//! Grounded on the original's `bundle_read_install_pkg`: Pre-install runs
//! `cwd`/`pre-exec` directives, Actual-install places every file-producing
//! and directory asset inside one catalog transaction, Post-install runs
//! `cwd`/`post-exec`/`ldconfig`/`info`/`touch` directives, shows the
//! package message, and is the only step that flips the row to `clean`.

use crate::callbacks::Callbacks;
use crate::error::EngineError;
use crate::message;
use crate::paths::Paths;
use mport_bundle::StagedBundle;
use mport_schema::{AssetKind, Package, PackageName, Phase};
use mport_store::Catalog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options controlling one install operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Record this package as pulled in automatically (a dependency, not a
    /// direct user request) so it's autoremove-eligible.
    pub automatic: bool,
    /// Skip the precondition gate (already-installed, OS mismatch,
    /// conflicts, unmet dependencies) and begin Phase B regardless.
    pub force: bool,
}

struct AmbientState {
    cwd: PathBuf,
    mode: Option<String>,
    owner: Option<String>,
    group: Option<String>,
}

/// Install the single package described by `bundle`.
#[tracing::instrument(skip(catalog, bundle, callbacks))]
pub fn install_one(
    catalog: &mut Catalog,
    paths: &Paths,
    bundle: &StagedBundle,
    options: InstallOptions,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<Package, EngineError> {
    let mut pkg = bundle.package_meta()?;
    pkg.automatic = options.automatic;
    pkg.prefix = if pkg.prefix.is_empty() {
        "/usr/local".to_string()
    } else {
        pkg.prefix.clone()
    };
    pkg.install_date = chrono::Utc::now().to_rfc3339();

    if !options.force {
        check_preconditions(catalog, bundle, &pkg)?;
    }

    callbacks.message(&format!("installing {} {}", pkg.name, pkg.version));

    do_pre_install(catalog, paths, bundle, &pkg, callbacks)?;
    let flatsize = do_actual_install(catalog, paths, bundle, &pkg, callbacks)?;
    do_post_install(catalog, paths, bundle, &pkg, flatsize, callbacks)?;

    callbacks.message(&format!("installed {} {}", pkg.name, pkg.version));
    Ok(pkg)
}

/// Reject an install before Phase B starts: already installed at the same
/// or a higher version, an OS mismatch, an installed conflicting package,
/// or a missing/too-old dependency. Every check returns `Warn` rather than
/// aborting the whole batch.
fn check_preconditions(catalog: &Catalog, bundle: &StagedBundle, pkg: &Package) -> Result<(), EngineError> {
    if let Some(existing) = catalog.get_package(pkg.name.as_str())? {
        if existing.version >= pkg.version {
            return Err(EngineError::warn(
                "install",
                Some(pkg.name.clone()),
                std::io::Error::other(format!("{} {} is already installed", pkg.name, existing.version)),
            ));
        }
    }

    if let Some(required) = &pkg.os_release {
        if required != std::env::consts::OS {
            return Err(EngineError::warn(
                "install",
                Some(pkg.name.clone()),
                std::io::Error::other(format!(
                    "{} requires os {required}, this host is {}",
                    pkg.name,
                    std::env::consts::OS
                )),
            ));
        }
    }

    for conflict in bundle.conflicts()? {
        if let Some(installed) = catalog.get_package(conflict.conflict_name.as_str())? {
            if installed.version >= conflict.conflict_version {
                return Err(EngineError::warn(
                    "install",
                    Some(pkg.name.clone()),
                    std::io::Error::other(format!(
                        "conflicts with installed {} {}",
                        conflict.conflict_name, installed.version
                    )),
                ));
            }
        }
    }

    for dep in bundle.depends()? {
        match catalog.get_package(dep.depend_name.as_str())? {
            Some(installed) if installed.version >= dep.depend_version => {}
            Some(installed) => {
                return Err(EngineError::warn(
                    "install",
                    Some(pkg.name.clone()),
                    std::io::Error::other(format!(
                        "requires {} >= {}, {} is installed",
                        dep.depend_name, dep.depend_version, installed.version
                    )),
                ));
            }
            None => {
                return Err(EngineError::warn(
                    "install",
                    Some(pkg.name.clone()),
                    std::io::Error::other(format!("requires {}, which is not installed", dep.depend_name)),
                ));
            }
        }
    }

    Ok(())
}

fn do_pre_install(
    catalog: &mut Catalog,
    paths: &Paths,
    bundle: &StagedBundle,
    pkg: &Package,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    catalog.attach_stub(&bundle.stub_db_path())?;
    let begin_result = catalog.install_begin(pkg);
    catalog.detach_stub()?;
    begin_result?;

    copy_infra_files(bundle, paths, &pkg.name, pkg.version.as_str())?;
    run_legacy_hook(paths, &pkg.name, pkg.version.as_str(), "PRE-INSTALL")?;

    let mut state = AmbientState {
        cwd: paths.resolve(&pkg.prefix),
        mode: None,
        owner: None,
        group: None,
    };

    for asset in bundle.assets_for_phase(Phase::Pre)? {
        match asset.kind {
            AssetKind::Cwd => set_cwd(paths, &mut state, &asset.data),
            AssetKind::PreExec => run_shell(&state.cwd, &asset.data)
                .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?,
            _ => {}
        }
    }
    let _ = callbacks;
    Ok(())
}

fn do_actual_install(
    catalog: &mut Catalog,
    paths: &Paths,
    bundle: &StagedBundle,
    pkg: &Package,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<u64, EngineError> {
    let mut assets = bundle.assets_for_phase(Phase::Actual)?;
    let file_count = bundle.file_count()?;
    callbacks.progress_init("installing", file_count);

    let mut state = AmbientState {
        cwd: paths.resolve(&pkg.prefix),
        mode: None,
        owner: None,
        group: None,
    };
    let mut flatsize: u64 = 0;

    for asset in &mut assets {
        match asset.kind {
            AssetKind::Cwd => set_cwd(paths, &mut state, &asset.data),
            AssetKind::Chmod => state.mode = Some(asset.data.clone()),
            AssetKind::Chown => state.owner = Some(asset.data.clone()),
            AssetKind::Chgrp => state.group = Some(asset.data.clone()),
            AssetKind::Directory => {
                let dest = state.cwd.join(&asset.data);
                std::fs::create_dir_all(&dest)
                    .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?;
                apply_ownership(&dest, &state);
            }
            AssetKind::DirectoryRemove | AssetKind::DirectoryRemoveTry => {
                // Recorded for delete-time use; nothing to do on install.
            }
            AssetKind::File | AssetKind::Shell | AssetKind::Info => {
                let (size, dest) = place_file(bundle, &state, &asset.data, false)
                    .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?;
                flatsize += size;
                asset.data = paths.to_stored_path(&dest);
                callbacks.progress_step();
            }
            AssetKind::Sample => {
                let (size, dest) = place_file(bundle, &state, &asset.data, true)
                    .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?;
                flatsize += size;
                asset.data = paths.to_stored_path(&dest);
                callbacks.progress_step();
            }
            AssetKind::Touch => {
                let dest = state.cwd.join(&asset.data);
                std::fs::write(&dest, [])
                    .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?;
            }
            AssetKind::PreExec
            | AssetKind::PostExec
            | AssetKind::Ldconfig
            | AssetKind::LdconfigLinux
            | AssetKind::Kld
            | AssetKind::DesktopDb => {}
            AssetKind::GlibSchemas => {}
        }
    }
    callbacks.progress_done();

    catalog.install_assets(&pkg.name, &assets)?;
    Ok(flatsize)
}

fn do_post_install(
    catalog: &mut Catalog,
    paths: &Paths,
    bundle: &StagedBundle,
    pkg: &Package,
    flatsize: u64,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    copy_infra_files(bundle, paths, &pkg.name, pkg.version.as_str())?;
    run_legacy_hook(paths, &pkg.name, pkg.version.as_str(), "POST-INSTALL")?;

    let mut state = AmbientState {
        cwd: paths.resolve(&pkg.prefix),
        mode: None,
        owner: None,
        group: None,
    };

    for asset in bundle.assets_for_phase(Phase::Post)? {
        match asset.kind {
            AssetKind::Cwd => set_cwd(paths, &mut state, &asset.data),
            AssetKind::PostExec => run_shell(&state.cwd, &asset.data)
                .map_err(|e| EngineError::fatal("install", Some(pkg.name.clone()), e))?,
            AssetKind::Ldconfig | AssetKind::LdconfigLinux | AssetKind::GlibSchemas => {
                run_ldconfig_like(asset.kind);
            }
            AssetKind::Kld => rebuild_kld_cache(&state.cwd),
            AssetKind::DesktopDb => refresh_desktop_db(&state.cwd),
            AssetKind::Info => register_info_page(&state.cwd.join(&asset.data)),
            AssetKind::Touch => {
                let dest = state.cwd.join(&asset.data);
                let _ = std::fs::write(&dest, []);
            }
            _ => {}
        }
    }

    if let Some(path) = paths
        .infra_dir(&pkg.name, pkg.version.as_str())
        .join("pkg-message")
        .canonicalize()
        .ok()
    {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            let entries = message::parse(&contents);
            for entry in message::applicable(&entries, None, message::MessageType::Install) {
                callbacks.message(&entry.message);
            }
        }
    }

    catalog.install_complete(&pkg.name, flatsize)?;
    Ok(())
}

fn copy_infra_files(
    bundle: &StagedBundle,
    paths: &Paths,
    name: &PackageName,
    version: &str,
) -> Result<(), EngineError> {
    let dest_dir = paths.infra_dir(name.as_str(), version);
    std::fs::create_dir_all(&dest_dir)
        .map_err(|e| EngineError::fatal("install", Some(name.clone()), e))?;
    for file in ["mtree", "pkg-install", "pkg-deinstall", "pkg-message"] {
        if let Some(src) = bundle.infra_file(name.as_str(), version, file) {
            std::fs::copy(&src, dest_dir.join(file))
                .map_err(|e| EngineError::fatal("install", Some(name.clone()), e))?;
        }
    }
    Ok(())
}

fn run_legacy_hook(paths: &Paths, name: &PackageName, version: &str, phase: &str) -> Result<(), EngineError> {
    let script = paths.infra_dir(name.as_str(), version).join("pkg-install");
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
        .env("PKG_PREFIX", paths.root())
        .status()
        .map_err(|e| EngineError::fatal("install", Some(name.clone()), e))?;
    if !status.success() {
        return Err(EngineError::fatal(
            "install",
            Some(name.clone()),
            std::io::Error::other(format!("{phase} hook exited with {status}")),
        ));
    }
    Ok(())
}

fn set_cwd(paths: &Paths, state: &mut AmbientState, data: &str) {
    let dest = paths.resolve(data);
    if data.starts_with("/compat/linux") {
        let _ = std::fs::create_dir_all(paths.resolve("/compat"));
    }
    let _ = std::fs::create_dir_all(&dest);
    state.cwd = dest;
}

fn run_shell(cwd: &Path, command: &str) -> std::io::Result<()> {
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .status()?;
    if !status.success() {
        return Err(std::io::Error::other(format!("command `{command}` exited with {status}")));
    }
    Ok(())
}

/// Place a file (or, for `sample`, a `.sample` template) and return its
/// size plus the destination actually written, for the caller to record in
/// the catalog.
///
/// For samples, `data` names either the sample source alone (the live
/// target is the same path with its trailing `.sample` stripped) or two
/// whitespace-separated tokens, sample source then live target. The sample
/// itself is always (re)written; the live target is only ever created, not
/// overwritten.
fn place_file(
    bundle: &StagedBundle,
    state: &AmbientState,
    relative: &str,
    sample: bool,
) -> std::io::Result<(u64, PathBuf)> {
    if sample {
        let (source, live) = sample_targets(relative);
        let sample_dest = write_one(bundle, state, &source)?;
        let live_dest = state.cwd.join(&live);
        if !live_dest.exists() {
            if let Some(parent) = live_dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&sample_dest, &live_dest)?;
            apply_ownership(&live_dest, state);
        }
        let size = std::fs::metadata(&sample_dest)?.len();
        return Ok((size, sample_dest));
    }
    let dest = write_one(bundle, state, relative)?;
    let size = std::fs::metadata(&dest)?.len();
    Ok((size, dest))
}

/// Split a sample asset's `data` into its source path and the live target
/// it guards, per `place_file`'s doc comment.
fn sample_targets(data: &str) -> (String, String) {
    if let Some((source, live)) = data.split_once(char::is_whitespace) {
        return (source.trim().to_string(), live.trim().to_string());
    }
    let live = data.strip_suffix(".sample").unwrap_or(data).to_string();
    (data.to_string(), live)
}

fn write_one(bundle: &StagedBundle, state: &AmbientState, relative: &str) -> std::io::Result<PathBuf> {
    let dest = state.cwd.join(relative);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let src = bundle.payload_root().join(relative);
    std::fs::copy(&src, &dest)?;
    apply_ownership(&dest, state);
    Ok(dest)
}

/// Apply the ambient mode/owner/group to a freshly placed file or
/// directory. Best-effort: a non-root run that can't `chown` logs and moves
/// on rather than failing the whole install.
fn apply_ownership(path: &Path, state: &AmbientState) {
    if let Some(mode) = &state.mode {
        if let Ok(parsed) = u32::from_str_radix(mode, 8) {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(parsed));
            }
        }
    }
    #[cfg(unix)]
    {
        if state.owner.is_some() || state.group.is_some() {
            // Only numeric owner/group entries are resolved; symbolic names
            // would need a passwd/group lookup, which isn't worth an unsafe
            // libc call for a best-effort path.
            let uid = state.owner.as_deref().and_then(|s| s.parse().ok());
            let gid = state.group.as_deref().and_then(|s| s.parse().ok());
            let _ = std::os::unix::fs::chown(path, uid, gid);
        }
    }
}

fn rebuild_kld_cache(cwd: &Path) {
    if which::which("kldxref").is_ok() {
        let _ = std::process::Command::new("kldxref").arg(cwd).status();
    }
}

fn refresh_desktop_db(cwd: &Path) {
    if which::which("update-desktop-database").is_ok() {
        let _ = std::process::Command::new("update-desktop-database").arg(cwd).status();
    }
}

fn run_ldconfig_like(kind: AssetKind) {
    let tool = match kind {
        AssetKind::Ldconfig | AssetKind::LdconfigLinux => "ldconfig",
        AssetKind::GlibSchemas => "glib-compile-schemas",
        _ => return,
    };
    if which::which(tool).is_ok() {
        let _ = std::process::Command::new(tool).status();
    }
}

fn register_info_page(path: &Path) {
    if which::which("install-info").is_ok() {
        let _ = std::process::Command::new("install-info").arg(path).status();
    }
}
