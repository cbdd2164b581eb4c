//! Upgrade Planner: migration pass (moved/expired packages) followed by a
//! postorder dependency walk that upgrades a package only after everything
//! it depends on has been brought up to date.
//!
//! Grounded on the original's `mport_upgrade`/`mport_update_down`, replacing
//! its pointer-keyed visited set with a plain `HashSet<PackageName>` owned
//! by the single planner invocation.

use crate::callbacks::{Answer, Callbacks};
use crate::error::EngineError;
use crate::paths::Paths;
use mport_schema::{Lock, Package, PackageName, Version};
use mport_store::Catalog;
use std::collections::HashSet;
use std::sync::Arc;

/// A candidate replacement for one installed package, as resolved against a
/// remote index by the caller (mport-cli's `ops` layer owns index lookups;
/// this engine only orchestrates catalog/dependency bookkeeping).
pub trait UpgradeSource {
    /// The newest version available for `name`, if any.
    fn latest_version(&self, name: &str) -> Option<Version>;

    /// Fetch and stage the package, returning the ready-to-install bundle
    /// handle's package metadata. Actual installation is delegated back to
    /// the caller via [`UpgradeSource::install`] so the planner stays
    /// storage-agnostic.
    fn install(&self, catalog: &mut Catalog, name: &str, automatic: bool) -> Result<Package, EngineError>;
}

/// Outcome of one `upgrade` invocation.
#[derive(Debug, Default)]
pub struct UpgradeReport {
    /// Packages actually upgraded, in the order they were processed.
    pub upgraded: Vec<PackageName>,
    /// Packages migrated away from (renamed or expired).
    pub migrated: Vec<PackageName>,
    /// Packages skipped because they're locked.
    pub skipped_locked: Vec<PackageName>,
}

/// Run the migration pass, then the postorder upgrade pass, over every
/// installed package (or just `targets` if non-empty).
pub fn upgrade(
    catalog: &mut Catalog,
    paths: &Paths,
    source: &dyn UpgradeSource,
    targets: &[String],
    callbacks: &Arc<dyn Callbacks>,
) -> Result<UpgradeReport, EngineError> {
    let mut processed: HashSet<PackageName> = HashSet::new();
    let mut report = UpgradeReport::default();

    migration_pass(catalog, paths, source, &mut processed, &mut report, callbacks)?;

    let installed = catalog.list_packages()?;
    let roots: Vec<Package> = if targets.is_empty() {
        installed
    } else {
        installed
            .into_iter()
            .filter(|p| targets.iter().any(|t| p.name == t.as_str()))
            .collect()
    };

    for pkg in roots {
        if processed.contains(&pkg.name) {
            continue;
        }
        update_down(catalog, paths, source, &pkg.name, &mut processed, &mut report, callbacks)?;
    }

    Ok(report)
}

fn migration_pass(
    catalog: &mut Catalog,
    paths: &Paths,
    source: &dyn UpgradeSource,
    processed: &mut HashSet<PackageName>,
    report: &mut UpgradeReport,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    for pkg in catalog.list_packages()? {
        if processed.contains(&pkg.name) {
            continue;
        }
        if let Some(moved) = catalog.moved_lookup(pkg.name.as_str())? {
            let automatic = pkg.automatic;
            match moved.to {
                Some(new_name) => {
                    if matches!(
                        callbacks.confirm(&format!(
                            "{} has moved to {} ({}); migrate?",
                            pkg.name, new_name, moved.reason
                        )),
                        Answer::Yes
                    ) {
                        crate::delete::delete_one(
                            catalog,
                            paths,
                            pkg.name.as_str(),
                            crate::delete::DeleteOptions { force: true },
                            callbacks,
                        )?;
                        source.install(catalog, new_name.as_str(), automatic)?;
                        report.migrated.push(pkg.name.clone());
                    }
                }
                None => {
                    if matches!(
                        callbacks.confirm(&format!("{} is expired ({}); remove?", pkg.name, moved.reason)),
                        Answer::Yes
                    ) {
                        crate::delete::delete_one(
                            catalog,
                            paths,
                            pkg.name.as_str(),
                            crate::delete::DeleteOptions { force: true },
                            callbacks,
                        )?;
                        report.migrated.push(pkg.name.clone());
                    }
                }
            }
            processed.insert(pkg.name.clone());
        }
    }
    Ok(())
}

/// Recursively upgrade everything `name` depends on before (potentially)
/// upgrading `name` itself. Returns once `name` is in `processed`,
/// guaranteeing termination on a dependency cycle.
fn update_down(
    catalog: &mut Catalog,
    paths: &Paths,
    source: &dyn UpgradeSource,
    name: &PackageName,
    processed: &mut HashSet<PackageName>,
    report: &mut UpgradeReport,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    if !processed.insert(name.clone()) {
        return Ok(());
    }

    let depends = catalog.list_depends(name.as_str())?;
    for dep in &depends {
        update_down(catalog, paths, source, &dep.depend_name, processed, report, callbacks)?;
        if index_check_newer(catalog, source, &dep.depend_name)? {
            do_upgrade(catalog, paths, source, &dep.depend_name, report, callbacks)?;
        }
    }

    if index_check_newer(catalog, source, name)? {
        do_upgrade(catalog, paths, source, name, report, callbacks)?;
    }
    Ok(())
}

fn index_check_newer(catalog: &Catalog, source: &dyn UpgradeSource, name: &str) -> Result<bool, EngineError> {
    let Some(installed) = catalog.get_package(name)? else {
        return Ok(false);
    };
    Ok(source
        .latest_version(name)
        .is_some_and(|latest| latest > installed.version))
}

fn do_upgrade(
    catalog: &mut Catalog,
    paths: &Paths,
    source: &dyn UpgradeSource,
    name: &PackageName,
    report: &mut UpgradeReport,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<(), EngineError> {
    let Some(installed) = catalog.get_package(name.as_str())? else {
        return Ok(());
    };
    if installed.lock == Lock::Locked {
        callbacks.message(&format!("{name} is locked, skipping upgrade"));
        report.skipped_locked.push(name.clone());
        return Ok(());
    }
    crate::delete::delete_one(
        catalog,
        paths,
        name.as_str(),
        crate::delete::DeleteOptions { force: true },
        callbacks,
    )?;
    source.install(catalog, name.as_str(), installed.automatic)?;
    report.upgraded.push(name.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mport_schema::{Lock, Status};
    use std::collections::HashMap;

    struct FakeSource {
        latest: HashMap<String, Version>,
    }

    impl UpgradeSource for FakeSource {
        fn latest_version(&self, name: &str) -> Option<Version> {
            self.latest.get(name).cloned()
        }

        fn install(&self, catalog: &mut Catalog, name: &str, automatic: bool) -> Result<Package, EngineError> {
            let pkg = Package {
                name: PackageName::new(name),
                version: self.latest.get(name).cloned().unwrap_or(Version::parse("0")),
                origin: String::new(),
                prefix: "/usr/local".into(),
                automatic,
                lock: Lock::Unlocked,
                status: Status::Clean,
                os_release: None,
                cpe: None,
                categories: vec![],
                install_date: String::new(),
                flat_size: 0,
            };
            catalog.raw().execute(
                "INSERT OR REPLACE INTO packages (name, version, origin, prefix, automatic, status, install_date) \
                 VALUES (?1, ?2, '', '/usr/local', ?3, 'clean', '')",
                rusqlite::params![name, pkg.version.as_str(), i64::from(automatic)],
            ).unwrap();
            Ok(pkg)
        }
    }

    #[test]
    fn cycle_terminates_via_visited_set() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.raw();
        conn.execute("INSERT INTO packages (name, version, origin, prefix, status, install_date) VALUES ('a','1.0','', '/usr/local','clean','')", []).unwrap();
        conn.execute("INSERT INTO packages (name, version, origin, prefix, status, install_date) VALUES ('b','1.0','', '/usr/local','clean','')", []).unwrap();
        conn.execute("INSERT INTO depends (pkg, depend_name, depend_version, depend_origin) VALUES ('a','b','1.0','')", []).unwrap();
        conn.execute("INSERT INTO depends (pkg, depend_name, depend_version, depend_origin) VALUES ('b','a','1.0','')", []).unwrap();

        let source = FakeSource { latest: HashMap::new() };
        let callbacks: Arc<dyn Callbacks> = Arc::new(crate::callbacks::NullCallbacks);
        let paths = Paths::default();
        let report = upgrade(&mut catalog, &paths, &source, &[], &callbacks).unwrap();
        assert!(report.upgraded.is_empty());
    }
}
