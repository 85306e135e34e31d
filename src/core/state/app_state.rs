use std::path::PathBuf;
use std::sync::Arc;

use crate::core::error::LauncherResult;
use crate::core::fetcher::LocatorFetcher;
use crate::core::http::build_http_client;
use crate::core::launch::LaunchPlanner;
use crate::core::manifest::ManifestStore;
use crate::core::paths::LauncherPaths;
use crate::core::sync::{HttpManifestSource, SyncEngine, DEFAULT_MANIFEST_URL};

pub type DefaultSyncEngine = SyncEngine<HttpManifestSource, LocatorFetcher>;

/// Where state lives and where the remote manifest is published.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub paths: LauncherPaths,
    pub manifest_url: String,
}

impl LauncherConfig {
    /// `None` falls back to the per-user config directory and the published
    /// manifest URL.
    pub fn new(config_root: Option<PathBuf>, manifest_url: Option<String>) -> LauncherResult<Self> {
        let paths = match config_root {
            Some(root) => LauncherPaths::with_root(root),
            None => LauncherPaths::from_user_config()?,
        };
        Ok(Self {
            paths,
            manifest_url: manifest_url.unwrap_or_else(|| DEFAULT_MANIFEST_URL.to_string()),
        })
    }
}

/// Everything the front-end commands operate on. Passed explicitly to each
/// command; nothing is read from ambient globals.
pub struct LauncherState {
    pub paths: LauncherPaths,
    pub sync_engine: Arc<DefaultSyncEngine>,
}

impl LauncherState {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        let http_client = build_http_client()?;
        let paths = config.paths;

        let source = HttpManifestSource::new(http_client.clone(), config.manifest_url);
        let fetcher = LocatorFetcher::new(http_client, paths.staging_root());
        let sync_engine = Arc::new(SyncEngine::new(
            paths.bundle_dir(),
            ManifestStore::new(paths.manifest_path()),
            source,
            fetcher,
        ));

        Ok(Self { paths, sync_engine })
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(self.paths.manifest_path())
    }

    pub fn launch_planner(&self) -> LaunchPlanner {
        LaunchPlanner::new(self.paths.bundle_dir(), self.manifest_store())
    }
}
