//! Exclusive-writer actor around [`Catalog`], for use from the async CLI.
//!
//! A dedicated OS thread owns the one live [`Catalog`] connection for the
//! whole process; callers talk to it over a channel and get their answer
//! back through a oneshot, so the blocking SQLite connection never touches
//! the tokio runtime.

use crate::catalog::Catalog;
use crate::error::StoreError;
use mport_schema::{Asset, Conflict, Dependency, Lock, LogEntry, Moved, Package, PackageName};
use std::path::PathBuf;
use std::sync::mpsc;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum CatalogEvent {
    GetPackage(String, Reply<Option<Package>>),
    ListPackages(Reply<Vec<Package>>),
    ListAssets(String, Reply<Vec<Asset>>),
    ListDepends(String, Reply<Vec<Dependency>>),
    ListDependents(String, Reply<Vec<PackageName>>),
    ListConflicts(String, Reply<Vec<Conflict>>),
    SetLock(String, Lock, Reply<()>),
    ListLocked(Reply<Vec<PackageName>>),
    ListAutomatic(Reply<Vec<PackageName>>),
    SetAutomatic(String, bool, Reply<()>),
    DeletePackage(PackageName, Reply<()>),
    RecordLog(LogEntry, Reply<()>),
    History(String, Reply<Vec<LogEntry>>),
    MovedLookup(String, Reply<Option<Moved>>),
    RecordMoved(Moved, Reply<()>),
    GetSetting(String, Reply<Option<String>>),
    SetSetting(String, String, Reply<()>),
    ListSettings(Reply<Vec<(String, String)>>),
    Shutdown,
}

impl std::fmt::Debug for CatalogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEvent").finish_non_exhaustive()
    }
}

/// A cloneable handle to the one catalog-writer thread.
#[derive(Clone)]
pub struct CatalogHandle {
    sender: mpsc::Sender<CatalogEvent>,
}

impl std::fmt::Debug for CatalogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogHandle").finish_non_exhaustive()
    }
}

impl CatalogHandle {
    /// Open the catalog at `path` on a dedicated thread and return a handle
    /// to it.
    pub fn spawn(path: PathBuf) -> Result<Self, StoreError> {
        let catalog = Catalog::open(&path)?;
        let (sender, receiver) = mpsc::channel();
        std::thread::Builder::new()
            .name("mport-catalog".into())
            .spawn(move || run_event_loop(catalog, receiver))
            .expect("failed to spawn catalog writer thread");
        Ok(Self { sender })
    }

    async fn request<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Reply<T>) -> CatalogEvent,
    {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(f(tx))
            .map_err(|_| StoreError::NoSuchPackage("catalog writer thread is gone".into()))?;
        rx.await
            .map_err(|_| StoreError::NoSuchPackage("catalog writer thread dropped the reply".into()))?
    }

    /// Fetch a single installed package row.
    pub async fn get_package(&self, name: impl Into<String>) -> Result<Option<Package>, StoreError> {
        let name = name.into();
        self.request(|reply| CatalogEvent::GetPackage(name, reply)).await
    }

    /// List every installed package.
    pub async fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        self.request(CatalogEvent::ListPackages).await
    }

    /// List the asset rows for `pkg`.
    pub async fn list_assets(&self, pkg: impl Into<String>) -> Result<Vec<Asset>, StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::ListAssets(pkg, reply)).await
    }

    /// List dependency edges owned by `pkg`.
    pub async fn list_depends(&self, pkg: impl Into<String>) -> Result<Vec<Dependency>, StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::ListDepends(pkg, reply)).await
    }

    /// List installed packages that directly depend on `pkg`.
    pub async fn list_dependents(&self, pkg: impl Into<String>) -> Result<Vec<PackageName>, StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::ListDependents(pkg, reply)).await
    }

    /// List conflict edges owned by `pkg`.
    pub async fn list_conflicts(&self, pkg: impl Into<String>) -> Result<Vec<Conflict>, StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::ListConflicts(pkg, reply)).await
    }

    /// Set the lock state of an installed package.
    pub async fn set_lock(&self, pkg: impl Into<String>, lock: Lock) -> Result<(), StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::SetLock(pkg, lock, reply)).await
    }

    /// List every explicitly locked package.
    pub async fn list_locked(&self) -> Result<Vec<PackageName>, StoreError> {
        self.request(CatalogEvent::ListLocked).await
    }

    /// List packages eligible for autoremove consideration.
    pub async fn list_automatic(&self) -> Result<Vec<PackageName>, StoreError> {
        self.request(CatalogEvent::ListAutomatic).await
    }

    /// Set a package's `automatic` flag.
    pub async fn set_automatic(&self, pkg: impl Into<String>, automatic: bool) -> Result<(), StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::SetAutomatic(pkg, automatic, reply)).await
    }

    /// Delete an installed package's catalog rows.
    pub async fn delete_package(&self, pkg: PackageName) -> Result<(), StoreError> {
        self.request(|reply| CatalogEvent::DeletePackage(pkg, reply)).await
    }

    /// Append an audit-log entry.
    pub async fn record_log(&self, entry: LogEntry) -> Result<(), StoreError> {
        self.request(|reply| CatalogEvent::RecordLog(entry, reply)).await
    }

    /// Fetch a package's audit-log history, newest first.
    pub async fn history(&self, pkg: impl Into<String>) -> Result<Vec<LogEntry>, StoreError> {
        let pkg = pkg.into();
        self.request(|reply| CatalogEvent::History(pkg, reply)).await
    }

    /// Look up a `moved` record by old package name.
    pub async fn moved_lookup(&self, from: impl Into<String>) -> Result<Option<Moved>, StoreError> {
        let from = from.into();
        self.request(|reply| CatalogEvent::MovedLookup(from, reply)).await
    }

    /// Record a rename/merge entry.
    pub async fn record_moved(&self, mv: Moved) -> Result<(), StoreError> {
        self.request(|reply| CatalogEvent::RecordMoved(mv, reply)).await
    }

    /// Get a setting value.
    pub async fn get_setting(&self, key: impl Into<String>) -> Result<Option<String>, StoreError> {
        let key = key.into();
        self.request(|reply| CatalogEvent::GetSetting(key, reply)).await
    }

    /// Set a setting value.
    pub async fn set_setting(&self, key: impl Into<String>, value: impl Into<String>) -> Result<(), StoreError> {
        let key = key.into();
        let value = value.into();
        self.request(|reply| CatalogEvent::SetSetting(key, value, reply)).await
    }

    /// List all settings.
    pub async fn list_settings(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.request(CatalogEvent::ListSettings).await
    }

    /// Ask the writer thread to exit. The handle is unusable afterward.
    pub fn shutdown(&self) {
        let _ = self.sender.send(CatalogEvent::Shutdown);
    }
}

fn run_event_loop(mut db: Catalog, receiver: mpsc::Receiver<CatalogEvent>) {
    while let Ok(event) = receiver.recv() {
        match event {
            CatalogEvent::GetPackage(name, reply) => {
                let _ = reply.send(db.get_package(&name));
            }
            CatalogEvent::ListPackages(reply) => {
                let _ = reply.send(db.list_packages());
            }
            CatalogEvent::ListAssets(pkg, reply) => {
                let _ = reply.send(db.list_assets(&pkg));
            }
            CatalogEvent::ListDepends(pkg, reply) => {
                let _ = reply.send(db.list_depends(&pkg));
            }
            CatalogEvent::ListDependents(pkg, reply) => {
                let _ = reply.send(db.list_dependents(&pkg));
            }
            CatalogEvent::ListConflicts(pkg, reply) => {
                let _ = reply.send(db.list_conflicts(&pkg));
            }
            CatalogEvent::SetLock(pkg, lock, reply) => {
                let _ = reply.send(db.set_lock(&pkg, lock));
            }
            CatalogEvent::ListLocked(reply) => {
                let _ = reply.send(db.list_locked());
            }
            CatalogEvent::ListAutomatic(reply) => {
                let _ = reply.send(db.list_automatic());
            }
            CatalogEvent::SetAutomatic(pkg, automatic, reply) => {
                let _ = reply.send(db.set_automatic(&pkg, automatic));
            }
            CatalogEvent::DeletePackage(pkg, reply) => {
                let _ = reply.send(db.delete_package(&pkg));
            }
            CatalogEvent::RecordLog(entry, reply) => {
                let _ = reply.send(db.record_log(&entry));
            }
            CatalogEvent::History(pkg, reply) => {
                let _ = reply.send(db.history(&pkg));
            }
            CatalogEvent::MovedLookup(from, reply) => {
                let _ = reply.send(db.moved_lookup(&from));
            }
            CatalogEvent::RecordMoved(mv, reply) => {
                let _ = reply.send(db.record_moved(&mv));
            }
            CatalogEvent::GetSetting(key, reply) => {
                let _ = reply.send(db.get_setting(&key));
            }
            CatalogEvent::SetSetting(key, value, reply) => {
                let _ = reply.send(db.set_setting(&key, &value));
            }
            CatalogEvent::ListSettings(reply) => {
                let _ = reply.send(db.list_settings());
            }
            CatalogEvent::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_and_round_trip_settings() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let handle = CatalogHandle::spawn(tmp.path().to_path_buf()).unwrap();
        handle.set_setting("mirror", "https://example.invalid").await.unwrap();
        assert_eq!(
            handle.get_setting("mirror").await.unwrap().as_deref(),
            Some("https://example.invalid")
        );
        handle.shutdown();
    }
}
