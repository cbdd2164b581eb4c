//! Autoremove: sweep packages that were pulled in only as dependencies and
//! are no longer depended on by anything installed.
//!
//! The original's traversal seeded its work queue from an uninitialized
//! pointer and only ever ran one pass, so a chain of three auto-installed
//! packages left the bottom one behind after the top two were swept in the
//! same invocation. This instead marks every automatic, unlocked, zero
//! dependent package, deletes them, and repeats until a round marks nothing
//! new — a proper fixed point within one call.

use crate::callbacks::Callbacks;
use crate::delete::{self, DeleteOptions};
use crate::error::EngineError;
use crate::paths::Paths;
use mport_schema::{Lock, PackageName};
use mport_store::Catalog;
use std::sync::Arc;

/// Outcome of one `autoremove` invocation.
#[derive(Debug, Default)]
pub struct AutoremoveReport {
    /// Packages removed, in the order each sweep round processed them.
    pub removed: Vec<PackageName>,
}

/// Repeatedly mark and delete automatic, unlocked packages with no
/// remaining dependents until a round removes nothing.
#[tracing::instrument(skip(catalog, callbacks))]
pub fn autoremove(
    catalog: &mut Catalog,
    paths: &Paths,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<AutoremoveReport, EngineError> {
    let mut report = AutoremoveReport::default();

    loop {
        let candidates = mark(catalog)?;
        if candidates.is_empty() {
            break;
        }
        for name in candidates {
            delete::delete_one(catalog, paths, name.as_str(), DeleteOptions { force: true }, callbacks)?;
            report.removed.push(name);
        }
    }

    if !report.removed.is_empty() {
        callbacks.message(&format!("autoremoved {} package(s)", report.removed.len()));
    }
    Ok(report)
}

/// One marking pass: every installed, automatic, unlocked package with no
/// dependent left among the currently installed set.
fn mark(catalog: &Catalog) -> Result<Vec<PackageName>, EngineError> {
    let mut orphans = Vec::new();
    for pkg in catalog.list_packages()? {
        if !pkg.automatic || pkg.lock == Lock::Locked {
            continue;
        }
        if catalog.list_dependents(pkg.name.as_str())?.is_empty() {
            orphans.push(pkg.name);
        }
    }
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NullCallbacks;

    fn insert_pkg(catalog: &Catalog, name: &str, automatic: bool) {
        catalog
            .raw()
            .execute(
                "INSERT INTO packages (name, version, origin, prefix, automatic, status, install_date) \
                 VALUES (?1, '1.0', '', '/usr/local', ?2, 'clean', '')",
                rusqlite::params![name, i64::from(automatic)],
            )
            .unwrap();
    }

    fn insert_dep(catalog: &Catalog, pkg: &str, depend_name: &str) {
        catalog
            .raw()
            .execute(
                "INSERT INTO depends (pkg, depend_name, depend_version, depend_origin) VALUES (?1, ?2, '', '')",
                rusqlite::params![pkg, depend_name],
            )
            .unwrap();
    }

    #[test]
    fn sweeps_a_chain_to_a_fixed_point_in_one_call() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        insert_pkg(&catalog, "x", false);
        insert_pkg(&catalog, "y", true);
        insert_pkg(&catalog, "z", true);
        insert_dep(&catalog, "x", "y");
        insert_dep(&catalog, "y", "z");

        // x is removed by the caller first, as if `mport delete x` already ran.
        catalog.delete_package(&PackageName::new("x")).unwrap();

        let paths = Paths::default();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        let report = autoremove(&mut catalog, &paths, &callbacks).unwrap();

        assert_eq!(report.removed.len(), 2);
        assert!(report.removed.iter().any(|n| n.as_str() == "y"));
        assert!(report.removed.iter().any(|n| n.as_str() == "z"));
        assert!(catalog.list_packages().unwrap().is_empty());
    }

    #[test]
    fn locked_automatic_package_survives() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        insert_pkg(&catalog, "y", true);
        catalog.set_lock("y", Lock::Locked).unwrap();

        let paths = Paths::default();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        let report = autoremove(&mut catalog, &paths, &callbacks).unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(catalog.list_packages().unwrap().len(), 1);
    }
}
