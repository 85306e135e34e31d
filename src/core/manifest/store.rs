use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::model::ModpackManifest;
use crate::core::error::{LauncherError, LauncherResult};

/// Reads and writes the installed bundle's `manifest.json`.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted manifest.
    ///
    /// `Ok(None)` means no manifest has been saved yet, which is the normal
    /// first-run state. A malformed file is a `Decode` error.
    pub async fn load(&self) -> LauncherResult<Option<ModpackManifest>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LauncherError::io(&self.path, e)),
        };

        ModpackManifest::from_json(&bytes, "local manifest").map(Some)
    }

    /// Version of the installed bundle, or `None` when the manifest is absent,
    /// unreadable or corrupt. Sync treats all of these as "nothing installed".
    pub async fn installed_version(&self) -> Option<String> {
        match self.load().await {
            Ok(manifest) => manifest.map(|m| m.version),
            Err(e) => {
                warn!("Ignoring unusable local manifest at {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Persist `manifest`, creating parent directories as needed.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// target, so readers see either the old or the new manifest.
    pub async fn save(&self, manifest: &ModpackManifest) -> LauncherResult<()> {
        let json = manifest.to_json()?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| LauncherError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| LauncherError::io(&self.path, e))?;

        debug!("Saved manifest {} to {:?}", manifest.version, self.path);
        Ok(())
    }
}
