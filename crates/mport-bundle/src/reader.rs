//! Staging and reading a package bundle.
//!
//! A bundle is a `tar`+`zstd` archive containing:
//!
//! ```text
//! stub.db                          -- one packages row, its assets/depends/conflicts/categories
//! infra/<name>-<version>/{mtree,pkg-install,pkg-deinstall,pkg-message}
//! payload/...                      -- the file tree referenced by file-producing assets
//! ```
//!
//! The archive codec itself is an implementation detail left opaque; this
//! is simply a concrete, inspectable instantiation of the "stub database
//! plus ordered payload" container shape.

use crate::error::BundleError;
use mport_schema::{Asset, AssetKind, Conflict, Dependency, Package, PackageName, Phase, Version};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A bundle archive unpacked into a temporary directory, ready to be read
/// phase by phase.
pub struct StagedBundle {
    root: PathBuf,
    _tempdir: TempDir,
}

impl std::fmt::Debug for StagedBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedBundle").field("root", &self.root).finish()
    }
}

impl StagedBundle {
    /// Unpack `archive_path` into a fresh temp directory.
    pub fn stage(archive_path: &Path) -> Result<Self, BundleError> {
        let tempdir = tempfile::tempdir()?;
        let file = std::fs::File::open(archive_path)?;
        let decoder = zstd::stream::read::Decoder::new(file)?;
        let mut archive = tar::Archive::new(decoder);
        archive.unpack(tempdir.path())?;
        Ok(Self {
            root: tempdir.path().to_path_buf(),
            _tempdir: tempdir,
        })
    }

    /// Path to the staged stub database.
    pub fn stub_db_path(&self) -> PathBuf {
        self.root.join("stub.db")
    }

    /// Root of the staged file payload.
    pub fn payload_root(&self) -> PathBuf {
        self.root.join("payload")
    }

    /// The directory holding this package's lifecycle/infra files.
    pub fn infra_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join("infra").join(format!("{name}-{version}"))
    }

    /// Path to a named lifecycle file (`mtree`, `pkg-install`,
    /// `pkg-deinstall`, `pkg-message`) if present.
    pub fn infra_file(&self, name: &str, version: &str, file: &str) -> Option<PathBuf> {
        let path = self.infra_dir(name, version).join(file);
        path.exists().then_some(path)
    }

    /// The single package this bundle describes.
    pub fn package_meta(&self) -> Result<Package, BundleError> {
        let conn = Connection::open(self.stub_db_path())?;
        let mut stmt = conn.prepare(
            "SELECT name, version, origin, prefix, os_release, cpe, categories_csv, install_date FROM packages",
        )?;
        let mut rows = stmt.query_map([], |r| {
            let version: String = r.get(1)?;
            let categories_csv: String = r.get(6)?;
            Ok(Package {
                name: PackageName::new(r.get::<_, String>(0)?),
                version: Version::parse(&version),
                origin: r.get(2)?,
                prefix: r.get(3)?,
                automatic: false,
                lock: mport_schema::Lock::Unlocked,
                status: mport_schema::Status::Dirty,
                os_release: r.get(4)?,
                cpe: r.get(5)?,
                categories: if categories_csv.is_empty() {
                    Vec::new()
                } else {
                    categories_csv.split(',').map(String::from).collect()
                },
                install_date: r.get(7)?,
                flat_size: 0,
            })
        })?;
        let first = rows.next().transpose()?;
        let count = usize::from(first.is_some()) + rows.count();
        match (first, count) {
            (Some(pkg), 1) => Ok(pkg),
            (_, n) => Err(BundleError::NotSinglePackage(n)),
        }
    }

    /// All asset rows belonging to `phase`, in original bundle order.
    pub fn assets_for_phase(&self, phase: Phase) -> Result<Vec<Asset>, BundleError> {
        let conn = Connection::open(self.stub_db_path())?;
        let mut stmt =
            conn.prepare("SELECT kind, data, checksum, owner, grp, mode FROM assets ORDER BY id")?;
        let rows = stmt.query_map([], |r| {
            let kind: String = r.get(0)?;
            Ok((
                parse_kind(&kind),
                Asset {
                    kind: parse_kind(&kind),
                    data: r.get(1)?,
                    checksum: r.get(2)?,
                    owner: r.get(3)?,
                    group: r.get(4)?,
                    mode: r.get(5)?,
                },
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (kind, asset) = row?;
            if kind.in_phase(phase) {
                out.push(asset);
            }
        }
        Ok(out)
    }

    /// Declared dependencies.
    pub fn depends(&self) -> Result<Vec<Dependency>, BundleError> {
        let conn = Connection::open(self.stub_db_path())?;
        let mut stmt =
            conn.prepare("SELECT pkg, depend_name, depend_version, depend_origin FROM depends")?;
        let rows = stmt.query_map([], |r| {
            let version: String = r.get(2)?;
            Ok(Dependency {
                pkg: PackageName::new(r.get::<_, String>(0)?),
                depend_name: PackageName::new(r.get::<_, String>(1)?),
                depend_version: Version::parse(&version),
                depend_origin: r.get(3)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(BundleError::from)
    }

    /// Declared conflicts.
    pub fn conflicts(&self) -> Result<Vec<Conflict>, BundleError> {
        let conn = Connection::open(self.stub_db_path())?;
        let mut stmt = conn.prepare("SELECT pkg, conflict_name, conflict_version FROM conflicts")?;
        let rows = stmt.query_map([], |r| {
            let version: String = r.get(2)?;
            Ok(Conflict {
                pkg: PackageName::new(r.get::<_, String>(0)?),
                conflict_name: PackageName::new(r.get::<_, String>(1)?),
                conflict_version: Version::parse(&version),
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(BundleError::from)
    }

    /// Count of file-producing assets, for sizing the install progress bar.
    pub fn file_count(&self) -> Result<u64, BundleError> {
        let conn = Connection::open(self.stub_db_path())?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assets WHERE kind IN ('file','sample','shell','info')",
            [],
            |r| r.get(0),
        )?;
        Ok(count as u64)
    }
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
    use std::io::Write;

    /// Build a synthetic bundle archive on disk for round-trip tests.
    fn build_test_bundle() -> tempfile::NamedTempFile {
        let work = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(work.path().join("payload/bin")).unwrap();
        std::fs::write(work.path().join("payload/bin/hello"), b"#!/bin/sh\necho hi\n").unwrap();
        std::fs::create_dir_all(work.path().join("infra/hello-1.0")).unwrap();
        std::fs::write(work.path().join("infra/hello-1.0/pkg-message"), "thanks for installing").unwrap();

        let db_path = work.path().join("stub.db");
        let conn = Connection::open(&db_path).unwrap();
        mport_store::schema::initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO packages (name, version, origin, prefix, status, install_date) \
             VALUES ('hello','1.0','misc/hello','/usr/local','dirty','')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO assets (pkg, kind, data) VALUES ('hello','file','bin/hello')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO assets (pkg, kind, data) VALUES ('hello','post-exec','echo done')",
            [],
        )
        .unwrap();
        drop(conn);

        let archive_path = tempfile::NamedTempFile::new().unwrap();
        let encoder = zstd::stream::write::Encoder::new(
            std::fs::File::create(archive_path.path()).unwrap(),
            0,
        )
        .unwrap();
        let mut builder = tar::Builder::new(encoder.auto_finish());
        builder.append_dir_all(".", work.path()).unwrap();
        builder.into_inner().unwrap().flush().unwrap();
        archive_path
    }

    #[test]
    fn stage_and_read_package_meta() {
        let archive = build_test_bundle();
        let staged = StagedBundle::stage(archive.path()).unwrap();
        let pkg = staged.package_meta().unwrap();
        assert_eq!(pkg.name.as_str(), "hello");
        assert_eq!(pkg.version.as_str(), "1.0");
    }

    #[test]
    fn phase_filtering_excludes_post_exec_from_actual() {
        let archive = build_test_bundle();
        let staged = StagedBundle::stage(archive.path()).unwrap();
        let actual = staged.assets_for_phase(Phase::Actual).unwrap();
        assert_eq!(actual.len(), 1);
        assert_eq!(actual[0].kind, AssetKind::File);

        let post = staged.assets_for_phase(Phase::Post).unwrap();
        assert_eq!(post.len(), 1);
        assert_eq!(post[0].kind, AssetKind::PostExec);
    }

    #[test]
    fn infra_file_lookup() {
        let archive = build_test_bundle();
        let staged = StagedBundle::stage(archive.path()).unwrap();
        assert!(staged.infra_file("hello", "1.0", "pkg-message").is_some());
        assert!(staged.infra_file("hello", "1.0", "pkg-install").is_none());
    }
}
