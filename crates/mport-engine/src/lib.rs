//! Install/Delete/Upgrade/Autoremove/Audit engines operating against a
//! [`mport_store::Catalog`] and a staged [`mport_bundle::StagedBundle`].
//!
//! Every engine function here is synchronous and single-threaded within one
//! invocation; the async CLI layer calls into this crate via
//! `tokio::task::spawn_blocking`. The only genuinely async surface is
//! [`audit::audit`], which performs the network advisory fetch directly.

pub mod audit;
pub mod autoremove;
pub mod callbacks;
pub mod delete;
pub mod error;
pub mod install;
pub mod message;
pub mod paths;
pub mod upgrade;

pub use audit::{audit, Advisory, PackageAudit};
pub use autoremove::{autoremove, AutoremoveReport};
pub use callbacks::{Answer, Callbacks, NullCallbacks};
pub use delete::{delete_one, DeleteOptions};
pub use error::{EngineError, Severity};
pub use install::{install_one, InstallOptions};
pub use paths::Paths;
pub use upgrade::{upgrade, UpgradeReport, UpgradeSource};
