//! mport - a Unix binary package manager.
//!
//! # Architecture
//!
//! - **Engine split**: `mport-engine`'s Install/Delete/Upgrade/Autoremove
//!   functions are synchronous and single-threaded; this crate calls them
//!   via `tokio::task::spawn_blocking` and keeps one `Catalog` connection
//!   open per invocation (either through the query-only `CatalogHandle`
//!   actor, or directly for commands that drive the engine).
//! - **Callbacks**: every engine-facing command builds a [`ui::TermCallbacks`]
//!   and passes it down instead of printing directly.

pub mod cmd;
pub mod download;
pub mod error;
pub mod remote;
pub mod ui;

pub use error::CliError;

use clap::{Parser, Subcommand, ValueEnum};
use mport_engine::{Callbacks, NullCallbacks, Paths};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(name = "mport", author, version, about = "mport - a Unix binary package manager")]
pub struct Cli {
    /// Operate against an alternate root, as if chrooted there.
    #[arg(long, global = true, value_name = "DIR")]
    pub chroot: Option<PathBuf>,

    /// Write any file this invocation produces (e.g. `export`) under this
    /// directory instead of the current one.
    #[arg(long, global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Skip loading the remote index (offline / local-bundle-only operation).
    #[arg(long, global = true)]
    pub no_index: bool,

    /// Proceed without interactive confirmation.
    #[arg(long, short, global = true)]
    pub force: bool,

    /// Suppress non-essential output.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Print only the minimum needed for scripting.
    #[arg(long, global = true)]
    pub brief: bool,

    /// Print extra diagnostic detail.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install one or more local bundle files.
    Add {
        /// Bundle files to install.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Mark as installed automatically (autoremove-eligible).
        #[arg(short = 'A', long)]
        automatic: bool,
    },
    /// Resolve and install packages from the index.
    Install {
        /// Package names.
        #[arg(required = true)]
        packages: Vec<String>,
        /// Mark as installed automatically (autoremove-eligible).
        #[arg(short = 'A', long)]
        automatic: bool,
    },
    /// Remove installed packages.
    Delete {
        /// Installed package names.
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Replace installed packages with their latest index version.
    Update {
        /// Installed package names.
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Run the upgrade planner over installed packages.
    Upgrade {
        /// Restrict to these packages (default: everything installed).
        packages: Vec<String>,
    },
    /// Sweep automatic packages with nothing depending on them.
    Autoremove,
    /// Check CVE advisories for installed packages.
    Audit {
        /// Also check indirect dependencies.
        #[arg(short = 'r', long)]
        recursive: bool,
        /// Limit to a single package.
        package: Option<String>,
    },
    /// Recheck installed asset checksums.
    Verify {
        /// Recompute and store fresh checksums instead of just comparing.
        #[arg(short = 'r', long)]
        recompute: bool,
        /// Limit to these packages (default: everything installed).
        packages: Vec<String>,
    },
    /// Pin a package against upgrade/autoremove.
    Lock {
        /// Package name.
        package: String,
    },
    /// Unpin a package.
    Unlock {
        /// Package name.
        package: String,
    },
    /// List locked packages.
    Locks,
    /// Enumerate installed packages.
    List {
        /// `updates` shows only packages with a newer index version;
        /// `prime` shows only explicitly installed (non-automatic) packages.
        mode: Option<ListMode>,
    },
    /// Show metadata for one installed package.
    Info {
        /// Package name.
        package: String,
    },
    /// Free-text search over the index.
    Search {
        /// Query terms.
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Refresh the local copy of the remote index.
    Index,
    /// Mirror selection helpers.
    Mirror {
        #[command(subcommand)]
        command: MirrorCommands,
    },
    /// Read or write the catalog's settings table.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the CPE identifier for installed packages.
    Cpe {
        /// Limit to a single package.
        package: Option<String>,
    },
    /// Print a package URL (purl) identifier for installed packages.
    Purl {
        /// Limit to a single package.
        package: Option<String>,
    },
    /// Compare two version strings.
    Version {
        /// Test mode: print the comparison result and exit 0/-1/+1.
        #[arg(short = 't')]
        test: bool,
        /// First version.
        v1: String,
        /// Second version.
        v2: String,
    },
    /// Reverse-lookup which installed package owns a file.
    Which {
        /// Print only the package name.
        #[arg(short = 'q', long)]
        quiet: bool,
        /// Print the package's origin instead of its name.
        #[arg(short = 'o', long)]
        origin: bool,
        /// Filesystem path to look up.
        path: PathBuf,
    },
    /// Serialize the installed set to a file.
    Import {
        /// File to read from.
        file: PathBuf,
    },
    /// Deserialize an installed-set file (metadata only, no reinstall).
    Export {
        /// File to write to.
        file: PathBuf,
    },
    /// Generate shell completions.
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for.
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListMode {
    /// Packages with a newer index version available.
    Updates,
    /// Explicitly installed (non-automatic) packages.
    Prime,
}

#[derive(Debug, Subcommand)]
pub enum MirrorCommands {
    /// List configured mirrors.
    List,
    /// Ping every configured mirror and record the fastest responder.
    Select,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// List every setting.
    List,
    /// Print one setting's value.
    Get {
        /// Setting key.
        key: String,
    },
    /// Write one setting's value.
    Set {
        /// Setting key.
        key: String,
        /// New value.
        value: String,
    },
}

/// State shared by every command: where the catalog lives, how to reach
/// the network, and how to report progress/confirm with the user.
#[derive(Clone)]
pub struct Context {
    pub paths: Paths,
    pub client: reqwest::Client,
    pub callbacks: Arc<dyn Callbacks>,
    pub no_index: bool,
    pub brief: bool,
}

impl Context {
    /// Build a context from the parsed global flags.
    pub fn new(cli: &Cli, assume_yes: bool) -> Self {
        let root = cli.chroot.clone().unwrap_or_else(|| PathBuf::from("/"));
        let paths = Paths::new(root);
        let callbacks: Arc<dyn Callbacks> = if cli.brief {
            Arc::new(NullCallbacks)
        } else {
            Arc::new(ui::TermCallbacks::new(assume_yes || cli.force, cli.quiet))
        };
        Self {
            paths,
            client: reqwest::Client::new(),
            callbacks,
            no_index: cli.no_index,
            brief: cli.brief,
        }
    }

    /// Path the index is cached under.
    pub fn index_cache_path(&self) -> PathBuf {
        self.paths.cache_dir().join("index.postcard.zst")
    }

    /// Load the cached index, if one has been fetched (`index` command) and
    /// `--no-index` wasn't passed.
    pub fn load_index(&self) -> Option<remote::Index> {
        if self.no_index {
            return None;
        }
        remote::Index::load(&self.index_cache_path()).ok()
    }
}
