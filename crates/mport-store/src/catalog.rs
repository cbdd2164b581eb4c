//! The synchronous catalog store: exclusive-writer state over a SQLite
//! connection. Engines hold a `&mut Catalog` for the duration of an
//! operation; the CLI layer wraps one in [`crate::actor::CatalogHandle`] to
//! keep it alive for a whole process run without blocking the async runtime.

use crate::error::StoreError;
use crate::schema;
use mport_schema::{Asset, AssetKind, Conflict, Dependency, Lock, LogEntry, Moved, Package, PackageName, Status, Version};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A connection to the on-disk catalog of installed packages.
#[derive(Debug)]
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open (creating if absent) the catalog database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory catalog, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Direct access to the underlying connection, for test fixtures and
    /// tooling that need to seed rows outside this API's transactions.
    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Attach a stub database (from a staged bundle) under the alias `stub`.
    pub fn attach_stub(&self, stub_path: &Path) -> Result<(), StoreError> {
        self.conn
            .execute("ATTACH DATABASE ?1 AS stub", params![stub_path.to_string_lossy()])
            .map_err(|source| StoreError::StubAttach {
                path: stub_path.display().to_string(),
                source,
            })?;
        Ok(())
    }

    /// Detach the previously attached stub database.
    pub fn detach_stub(&self) -> Result<(), StoreError> {
        self.conn.execute("DETACH DATABASE stub", [])?;
        Ok(())
    }

    /// Begin installing `pkg`: insert its `packages` row as `dirty`, plus
    /// depends/conflicts/categories, all from the attached stub database.
    ///
    /// Must run inside the stub database's attach span.
    pub fn install_begin(&mut self, pkg: &Package) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO packages (name, version, origin, prefix, automatic, locked, status,
                                    os_release, cpe, categories_csv, install_date, flatsize)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 'dirty', ?6, ?7, ?8, ?9, 0)",
            params![
                pkg.name.as_str(),
                pkg.version.as_str(),
                pkg.origin,
                pkg.prefix,
                i64::from(pkg.automatic),
                pkg.os_release,
                pkg.cpe,
                pkg.categories.join(","),
                pkg.install_date,
            ],
        )?;
        tx.execute(
            "INSERT INTO depends (pkg, depend_name, depend_version, depend_origin)
             SELECT ?1, depend_name, depend_version, depend_origin FROM stub.depends WHERE pkg = ?1",
            params![pkg.name.as_str()],
        )?;
        tx.execute(
            "INSERT INTO conflicts (pkg, conflict_name, conflict_version)
             SELECT ?1, conflict_name, conflict_version FROM stub.conflicts WHERE pkg = ?1",
            params![pkg.name.as_str()],
        )?;
        tx.execute(
            "INSERT INTO categories (pkg, category)
             SELECT ?1, category FROM stub.categories WHERE pkg = ?1",
            params![pkg.name.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Insert every asset row for `pkg` inside one transaction (Phase B of
    /// install). `assets` is walked in bundle order; file-kind checksums and
    /// ambient owner/group/mode are captured per row.
    pub fn install_assets(&mut self, pkg: &PackageName, assets: &[Asset]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assets (pkg, kind, data, checksum, owner, grp, mode)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for asset in assets {
                stmt.execute(params![
                    pkg.as_str(),
                    asset.kind.to_string(),
                    asset.data,
                    asset.checksum,
                    asset.owner,
                    asset.group,
                    asset.mode,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Flip `pkg`'s status to `clean` as the sole statement of its own
    /// transaction — the last act of Phase C.
    pub fn install_complete(&mut self, pkg: &PackageName, flatsize: u64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE packages SET status = 'clean', flatsize = ?2 WHERE name = ?1",
            params![pkg.as_str(), flatsize as i64],
        )?;
        if changed == 0 {
            return Err(StoreError::NoSuchPackage(pkg.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert a `clean` package row (plus its dependency edges) directly,
    /// bypassing the stub-attach dance `install_begin` requires — used to
    /// restore metadata from an `export`ed set, not to install a bundle.
    pub fn import_package(&mut self, pkg: &Package, depends: &[Dependency]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO packages (name, version, origin, prefix, automatic, locked, status,
                                    os_release, cpe, categories_csv, install_date, flatsize)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'clean', ?7, ?8, ?9, ?10, ?11)",
            params![
                pkg.name.as_str(),
                pkg.version.as_str(),
                pkg.origin,
                pkg.prefix,
                i64::from(pkg.automatic),
                i64::from(pkg.lock == Lock::Locked),
                pkg.os_release,
                pkg.cpe,
                pkg.categories.join(","),
                pkg.install_date,
                pkg.flat_size as i64,
            ],
        )?;
        for dep in depends {
            tx.execute(
                "INSERT INTO depends (pkg, depend_name, depend_version, depend_origin)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    pkg.name.as_str(),
                    dep.depend_name.as_str(),
                    dep.depend_version.as_str(),
                    dep.depend_origin,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove `pkg` and every row that references it.
    pub fn delete_package(&mut self, pkg: &PackageName) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM assets WHERE pkg = ?1", params![pkg.as_str()])?;
        tx.execute("DELETE FROM depends WHERE pkg = ?1", params![pkg.as_str()])?;
        tx.execute("DELETE FROM conflicts WHERE pkg = ?1", params![pkg.as_str()])?;
        tx.execute("DELETE FROM categories WHERE pkg = ?1", params![pkg.as_str()])?;
        let changed = tx.execute("DELETE FROM packages WHERE name = ?1", params![pkg.as_str()])?;
        if changed == 0 {
            return Err(StoreError::NoSuchPackage(pkg.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch a single package row, if installed.
    pub fn get_package(&self, name: &str) -> Result<Option<Package>, StoreError> {
        self.conn
            .query_row(
                "SELECT name, version, origin, prefix, automatic, locked, status,
                        os_release, cpe, categories_csv, install_date, flatsize
                 FROM packages WHERE name = ?1",
                params![name],
                row_to_package,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// List every installed package.
    pub fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, version, origin, prefix, automatic, locked, status,
                    os_release, cpe, categories_csv, install_date, flatsize
             FROM packages ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_package)?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// List the asset rows for `pkg`, in original bundle order.
    pub fn list_assets(&self, pkg: &str) -> Result<Vec<Asset>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, data, checksum, owner, grp, mode FROM assets WHERE pkg = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![pkg], |r| {
            let kind: String = r.get(0)?;
            Ok(Asset {
                kind: parse_kind(&kind),
                data: r.get(1)?,
                checksum: r.get(2)?,
                owner: r.get(3)?,
                group: r.get(4)?,
                mode: r.get(5)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// List dependency edges owned by `pkg`.
    pub fn list_depends(&self, pkg: &str) -> Result<Vec<Dependency>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT pkg, depend_name, depend_version, depend_origin FROM depends WHERE pkg = ?1")?;
        let rows = stmt.query_map(params![pkg], |r| {
            let version: String = r.get(2)?;
            Ok(Dependency {
                pkg: PackageName::new(r.get::<_, String>(0)?),
                depend_name: PackageName::new(r.get::<_, String>(1)?),
                depend_version: Version::parse(&version),
                depend_origin: r.get(3)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// List every installed package that directly depends on `pkg`.
    pub fn list_dependents(&self, pkg: &str) -> Result<Vec<PackageName>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT pkg FROM depends WHERE depend_name = ?1")?;
        let rows = stmt.query_map(params![pkg], |r| Ok(PackageName::new(r.get::<_, String>(0)?)))?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// List conflict edges owned by `pkg`.
    pub fn list_conflicts(&self, pkg: &str) -> Result<Vec<Conflict>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT pkg, conflict_name, conflict_version FROM conflicts WHERE pkg = ?1")?;
        let rows = stmt.query_map(params![pkg], |r| {
            let version: String = r.get(2)?;
            Ok(Conflict {
                pkg: PackageName::new(r.get::<_, String>(0)?),
                conflict_name: PackageName::new(r.get::<_, String>(1)?),
                conflict_version: Version::parse(&version),
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// Set the lock state of an installed package.
    pub fn set_lock(&mut self, pkg: &str, lock: Lock) -> Result<(), StoreError> {
        let locked = matches!(lock, Lock::Locked);
        let changed = self.conn.execute(
            "UPDATE packages SET locked = ?2 WHERE name = ?1",
            params![pkg, i64::from(locked)],
        )?;
        if changed == 0 {
            return Err(StoreError::NoSuchPackage(pkg.to_string()));
        }
        Ok(())
    }

    /// List every explicitly locked package.
    pub fn list_locked(&self) -> Result<Vec<PackageName>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM packages WHERE locked = 1 ORDER BY name")?;
        let rows = stmt.query_map([], |r| Ok(PackageName::new(r.get::<_, String>(0)?)))?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// List packages installed only as a dependency (`automatic = true`),
    /// the candidate set for autoremove.
    pub fn list_automatic(&self) -> Result<Vec<PackageName>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM packages WHERE automatic = 1 AND locked = 0 ORDER BY name")?;
        let rows = stmt.query_map([], |r| Ok(PackageName::new(r.get::<_, String>(0)?)))?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// Mark a package's `automatic` flag (used when migrating a moved
    /// package so the flag survives the delete+reinstall).
    pub fn set_automatic(&mut self, pkg: &str, automatic: bool) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE packages SET automatic = ?2 WHERE name = ?1",
            params![pkg, i64::from(automatic)],
        )?;
        Ok(())
    }

    /// Append a catalog audit-log entry.
    pub fn record_log(&mut self, entry: &LogEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO log (pkg, version, instant, message) VALUES (?1, ?2, ?3, ?4)",
            params![entry.pkg.as_str(), entry.version.as_str(), entry.instant, entry.message],
        )?;
        Ok(())
    }

    /// List the audit-log history for a package, newest first.
    pub fn history(&self, pkg: &str) -> Result<Vec<LogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pkg, version, instant, message FROM log WHERE pkg = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![pkg], |r| {
            let version: String = r.get(1)?;
            Ok(LogEntry {
                pkg: PackageName::new(r.get::<_, String>(0)?),
                version: Version::parse(&version),
                instant: r.get(2)?,
                message: r.get(3)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }

    /// Look up a `moved` record by old name.
    pub fn moved_lookup(&self, from: &str) -> Result<Option<Moved>, StoreError> {
        self.conn
            .query_row(
                "SELECT from_name, to_name, move_date, reason FROM moved WHERE from_name = ?1",
                params![from],
                |r| {
                    Ok(Moved {
                        from: PackageName::new(r.get::<_, String>(0)?),
                        to: r.get::<_, Option<String>>(1)?.map(PackageName::new),
                        date: r.get(2)?,
                        reason: r.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Insert or replace a `moved` record.
    pub fn record_moved(&mut self, mv: &Moved) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO moved (from_name, to_name, move_date, reason) VALUES (?1, ?2, ?3, ?4)",
            params![mv.from.as_str(), mv.to.as_ref().map(PackageName::as_str), mv.date, mv.reason],
        )?;
        Ok(())
    }

    /// Get a setting value, if present.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |r| r.get(0))
            .optional()
            .map_err(StoreError::from)
    }

    /// Set (or overwrite) a setting value.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// List all settings.
    pub fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect::<Result<_, _>>().map_err(StoreError::from)
    }
}

fn row_to_package(r: &rusqlite::Row<'_>) -> rusqlite::Result<Package> {
    let version: String = r.get(1)?;
    let automatic: i64 = r.get(4)?;
    let locked: i64 = r.get(5)?;
    let status: String = r.get(6)?;
    let categories_csv: String = r.get(9)?;
    Ok(Package {
        name: PackageName::new(r.get::<_, String>(0)?),
        version: Version::parse(&version),
        origin: r.get(2)?,
        prefix: r.get(3)?,
        automatic: automatic != 0,
        lock: if locked != 0 { Lock::Locked } else { Lock::Unlocked },
        status: if status == "clean" { Status::Clean } else { Status::Dirty },
        os_release: r.get(7)?,
        cpe: r.get(8)?,
        categories: if categories_csv.is_empty() {
            Vec::new()
        } else {
            categories_csv.split(',').map(String::from).collect()
        },
        install_date: r.get(10)?,
        flat_size: r.get::<_, i64>(11)? as u64,
    })
}

fn parse_kind(s: &str) -> AssetKind {
    match s {
        "cwd" => AssetKind::Cwd,
        "chmod" => AssetKind::Chmod,
        "chown" => AssetKind::Chown,
        "chgrp" => AssetKind::Chgrp,
        "sample" => AssetKind::Sample,
        "shell" => AssetKind::Shell,
        "info" => AssetKind::Info,
        "touch" => AssetKind::Touch,
        "directory" => AssetKind::Directory,
        "directory-remove" => AssetKind::DirectoryRemove,
        "directory-remove-try" => AssetKind::DirectoryRemoveTry,
        "pre-exec" => AssetKind::PreExec,
        "post-exec" => AssetKind::PostExec,
        "ldconfig" => AssetKind::Ldconfig,
        "ldconfig-linux" => AssetKind::LdconfigLinux,
        "glib-schemas" => AssetKind::GlibSchemas,
        "kld" => AssetKind::Kld,
        "desktop-db" => AssetKind::DesktopDb,
        _ => AssetKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package() -> Package {
        Package {
            name: PackageName::new("zsh"),
            version: Version::parse("5.9"),
            origin: "shells/zsh".into(),
            prefix: "/usr/local".into(),
            automatic: false,
            lock: Lock::Unlocked,
            status: Status::Dirty,
            os_release: None,
            cpe: None,
            categories: vec!["shells".into()],
            install_date: "2026-07-28T00:00:00Z".into(),
            flat_size: 0,
        }
    }

    #[test]
    fn install_without_stub_fails_cleanly() {
        let mut cat = Catalog::open_in_memory().unwrap();
        // No stub attached: depends/conflicts/categories selects against
        // `stub.*` fail with a SQL error, not a panic.
        assert!(cat.install_begin(&sample_package()).is_err());
    }

    #[test]
    fn install_complete_then_lookup() {
        let mut cat = Catalog::open_in_memory().unwrap();
        // Attach an empty stub database to satisfy the SELECT ... FROM
        // stub.* joins with an empty result set.
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let stub = Connection::open(tmp.path()).unwrap();
        schema::initialize(&stub).unwrap();
        drop(stub);
        cat.attach_stub(tmp.path()).unwrap();
        cat.install_begin(&sample_package()).unwrap();
        cat.detach_stub().unwrap();

        let pkg = cat.get_package("zsh").unwrap().unwrap();
        assert_eq!(pkg.status, Status::Dirty);

        cat.install_complete(&PackageName::new("zsh"), 4096).unwrap();
        let pkg = cat.get_package("zsh").unwrap().unwrap();
        assert_eq!(pkg.status, Status::Clean);
        assert_eq!(pkg.flat_size, 4096);
    }

    #[test]
    fn delete_missing_package_errors() {
        let mut cat = Catalog::open_in_memory().unwrap();
        assert!(cat.delete_package(&PackageName::new("nope")).is_err());
    }

    #[test]
    fn lock_round_trip() {
        let mut cat = Catalog::open_in_memory().unwrap();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let stub = Connection::open(tmp.path()).unwrap();
        schema::initialize(&stub).unwrap();
        drop(stub);
        cat.attach_stub(tmp.path()).unwrap();
        cat.install_begin(&sample_package()).unwrap();
        cat.detach_stub().unwrap();

        cat.set_lock("zsh", Lock::Locked).unwrap();
        assert_eq!(cat.list_locked().unwrap(), vec![PackageName::new("zsh")]);
    }
}
