//! Persistent state layout, made `--chroot`-aware.
//!
//! Every path here is rooted under an explicit `root` — `/` by default, or
//! the directory passed via the global `--chroot` flag.

use std::path::{Path, PathBuf};

/// Resolved filesystem layout for one engine invocation.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Build a layout rooted at `root` (the chroot target, or `/`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root all other paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Master catalog database path.
    pub fn db_path(&self) -> PathBuf {
        self.root.join("var/db/mport/local.sqlite")
    }

    /// Bundle download cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("var/cache/mport")
    }

    /// Per-package infra directory (`mtree`, lifecycle scripts, message).
    pub fn infra_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join("var/db/mport/pkg-infra")
            .join(format!("{name}-{version}"))
    }

    /// Directory `mport` writes transcripts/build logs under.
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("var/log/mport")
    }

    /// Scratch directory for staging bundles before install.
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("var/tmp/mport")
    }

    /// Resolve a path recorded in the catalog (already root-relative for
    /// file-kind assets) against this layout's root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }

    /// Turn an absolute filesystem path already under this layout's root
    /// into the root-relative, leading-`/`-prefixed form the catalog stores
    /// for file-producing assets. Falls back to `absolute` unchanged if it
    /// isn't under `root`.
    pub fn to_stored_path(&self, absolute: &Path) -> String {
        match absolute.strip_prefix(&self.root) {
            Ok(rel) => format!("/{}", rel.to_string_lossy()),
            Err(_) => absolute.to_string_lossy().into_owned(),
        }
    }

    /// Ensure the ambient state directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.cache_dir(), self.log_dir(), self.tmp_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.db_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_strips_leading_slash_before_joining_root() {
        let paths = Paths::new("/chroot/target");
        assert_eq!(
            paths.resolve("/usr/local/bin/zsh"),
            PathBuf::from("/chroot/target/usr/local/bin/zsh")
        );
    }

    #[test]
    fn to_stored_path_is_the_inverse_of_resolve() {
        let paths = Paths::new("/chroot/target");
        let resolved = paths.resolve("/usr/local/bin/zsh");
        assert_eq!(paths.to_stored_path(&resolved), "/usr/local/bin/zsh");
    }

    #[test]
    fn infra_dir_is_versioned() {
        let paths = Paths::new("/");
        assert_eq!(
            paths.infra_dir("zsh", "5.9"),
            PathBuf::from("/var/db/mport/pkg-infra/zsh-5.9")
        );
    }
}
