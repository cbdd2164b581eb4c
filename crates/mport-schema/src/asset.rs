//! The closed set of asset (plist directive) kinds a bundle payload can carry.
//!
//! Ordering matters: assets are iterated in bundle order for every install
//! phase, and each phase filters this set down to the variants relevant to
//! it (see [`Asset::phases`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single plist-directive asset entry, in the order it appeared in the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// The directive kind.
    pub kind: AssetKind,
    /// The kind-specific payload: a path, a command line, a mode string, etc.
    pub data: String,
    /// Checksum of file content, present only for file-producing kinds.
    pub checksum: Option<String>,
    /// Owning user, if overridden by a preceding `@owner` directive.
    pub owner: Option<String>,
    /// Owning group, if overridden by a preceding `@group` directive.
    pub group: Option<String>,
    /// File mode, if overridden by a preceding `@mode` directive.
    pub mode: Option<String>,
}

/// The install phase an asset directive is relevant to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Runs before any file is placed.
    Pre,
    /// Runs while files are being placed.
    Actual,
    /// Runs after every file has been placed.
    Post,
}

/// The closed set of asset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// Change the ambient working directory for subsequent relative assets.
    Cwd,
    /// Change the ambient mode for subsequent file/directory assets.
    Chmod,
    /// Change the ambient owner for subsequent file/directory assets.
    Chown,
    /// Change the ambient group for subsequent file/directory assets.
    Chgrp,
    /// A regular file to place.
    File,
    /// A sample config file: copied only if the destination doesn't exist.
    Sample,
    /// A file that must be executable (shell script, wrapper).
    Shell,
    /// A GNU info page to register.
    Info,
    /// Touch (create if absent) a file with no content.
    Touch,
    /// A directory to create.
    Directory,
    /// A directory to remove on uninstall; errors if non-empty.
    DirectoryRemove,
    /// A directory to remove on uninstall; best-effort, ignores non-empty.
    DirectoryRemoveTry,
    /// A command to run before any file in this phase is placed.
    PreExec,
    /// A command to run after every file in this phase has been placed.
    PostExec,
    /// Regenerate the dynamic linker cache after install.
    Ldconfig,
    /// Regenerate the Linux-ABI dynamic linker cache after install.
    LdconfigLinux,
    /// Recompile GLib schemas after install.
    GlibSchemas,
    /// Rebuild the kernel module cache after install.
    Kld,
    /// Refresh the desktop-entry MIME database after install.
    DesktopDb,
}

impl AssetKind {
    /// Whether this kind's `data` ultimately produces a filesystem file
    /// (used to size the install progress bar).
    pub fn produces_file(self) -> bool {
        matches!(self, Self::File | Self::Sample | Self::Shell | Self::Info)
    }

    /// Whether this kind belongs to the given install phase.
    pub fn in_phase(self, phase: Phase) -> bool {
        match phase {
            Phase::Pre => matches!(self, Self::Cwd | Self::PreExec),
            Phase::Post => matches!(
                self,
                Self::Cwd
                    | Self::PostExec
                    | Self::Ldconfig
                    | Self::LdconfigLinux
                    | Self::GlibSchemas
                    | Self::Kld
                    | Self::DesktopDb
                    | Self::Info
                    | Self::Touch
            ),
            Phase::Actual => !matches!(
                self,
                Self::PreExec
                    | Self::PostExec
                    | Self::Ldconfig
                    | Self::LdconfigLinux
                    | Self::Kld
                    | Self::DesktopDb
            ),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cwd => "cwd",
            Self::Chmod => "chmod",
            Self::Chown => "chown",
            Self::Chgrp => "chgrp",
            Self::File => "file",
            Self::Sample => "sample",
            Self::Shell => "shell",
            Self::Info => "info",
            Self::Touch => "touch",
            Self::Directory => "directory",
            Self::DirectoryRemove => "directory-remove",
            Self::DirectoryRemoveTry => "directory-remove-try",
            Self::PreExec => "pre-exec",
            Self::PostExec => "post-exec",
            Self::Ldconfig => "ldconfig",
            Self::LdconfigLinux => "ldconfig-linux",
            Self::GlibSchemas => "glib-schemas",
            Self::Kld => "kld",
            Self::DesktopDb => "desktop-db",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_filters_are_disjoint_for_exec_hooks() {
        assert!(AssetKind::PreExec.in_phase(Phase::Pre));
        assert!(!AssetKind::PreExec.in_phase(Phase::Actual));
        assert!(!AssetKind::PreExec.in_phase(Phase::Post));

        assert!(AssetKind::PostExec.in_phase(Phase::Post));
        assert!(!AssetKind::PostExec.in_phase(Phase::Actual));
    }

    #[test]
    fn file_is_actual_only() {
        assert!(AssetKind::File.in_phase(Phase::Actual));
        assert!(!AssetKind::File.in_phase(Phase::Pre));
        assert!(!AssetKind::File.in_phase(Phase::Post));
    }
}
