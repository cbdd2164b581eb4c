//! `mport upgrade`: run the Upgrade Planner over installed packages.

use crate::error::CliError;
use crate::remote::Index;
use crate::Context;
use mport_engine::{EngineError, UpgradeSource};
use mport_schema::{Package, Version};
use mport_store::Catalog;
use std::path::PathBuf;

/// Resolves [`UpgradeSource`] against a loaded [`Index`], downloading and
/// installing with a blocking HTTP client — the planner itself stays
/// synchronous, so this runs entirely inside `spawn_blocking`.
pub struct IndexUpgradeSource {
    index: Index,
    cache_dir: PathBuf,
    paths: mport_engine::Paths,
    client: reqwest::blocking::Client,
}

impl IndexUpgradeSource {
    /// Build a source over `index`, resolving bundles under `paths`.
    pub fn new(index: Index, paths: mport_engine::Paths) -> Self {
        Self {
            cache_dir: paths.cache_dir(),
            paths,
            index,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl UpgradeSource for IndexUpgradeSource {
    fn latest_version(&self, name: &str) -> Option<Version> {
        self.index.find(name).map(|e| e.version.clone())
    }

    fn install(&self, catalog: &mut Catalog, name: &str, automatic: bool) -> Result<Package, EngineError> {
        let entry = self
            .index
            .find(name)
            .ok_or_else(|| EngineError::fatal("upgrade", None, std::io::Error::other(format!("{name}: not in index"))))?;

        std::fs::create_dir_all(&self.cache_dir).map_err(|e| EngineError::fatal("upgrade", None, e))?;
        let dest = self.cache_dir.join(format!("{}-{}.bundle", entry.name, entry.version));
        let bytes = self
            .client
            .get(&entry.url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| EngineError::fatal("upgrade", None, std::io::Error::other(e.to_string())))?;
        std::fs::write(&dest, &bytes).map_err(|e| EngineError::fatal("upgrade", None, e))?;

        let bundle = mport_bundle::StagedBundle::stage(&dest)?;
        mport_engine::install_one(
            catalog,
            &self.paths,
            &bundle,
            mport_engine::InstallOptions { automatic, force: true },
            &(std::sync::Arc::new(mport_engine::NullCallbacks) as std::sync::Arc<dyn mport_engine::Callbacks>),
        )
    }
}

/// Run the planner, restricted to `packages` if non-empty.
pub async fn run(ctx: &Context, packages: &[String]) -> Result<(), CliError> {
    let index = ctx
        .load_index()
        .ok_or_else(|| CliError::Nothing("no index loaded; run `mport index` first".into()))?;

    let paths = ctx.paths.clone();
    let callbacks = ctx.callbacks.clone();
    let packages = packages.to_vec();

    tokio::task::spawn_blocking(move || -> Result<(), CliError> {
        let mut catalog = Catalog::open(&paths.db_path())?;
        let source = IndexUpgradeSource::new(index, paths.clone());
        let report = mport_engine::upgrade(&mut catalog, &paths, &source, &packages, &callbacks)?;
        if report.upgraded.is_empty() && report.migrated.is_empty() {
            return Err(CliError::Nothing("nothing to upgrade".into()));
        }
        Ok(())
    })
    .await
    .map_err(|e| CliError::Other(e.to_string()))?
}
