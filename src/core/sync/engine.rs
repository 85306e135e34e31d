// ─── Sync Engine ───
// Compares the installed manifest with the remote one and, when the versions
// differ, installs the remote bundle and then records its manifest.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::remote::ManifestSource;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fetcher::{ContentFetcher, FetchContext};
use crate::core::manifest::ManifestStore;

/// What a completed `check_and_sync` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Installed version already matches the remote one.
    UpToDate { version: String },
    /// A new bundle was installed.
    Updated {
        previous: Option<String>,
        current: String,
    },
}

pub struct SyncEngine<S, F> {
    bundle_dir: PathBuf,
    store: ManifestStore,
    source: S,
    fetcher: F,
    /// Held for the whole of one sync; a second caller fails fast.
    in_flight: Mutex<()>,
}

impl<S, F> SyncEngine<S, F>
where
    S: ManifestSource,
    F: ContentFetcher,
{
    pub fn new(bundle_dir: PathBuf, store: ManifestStore, source: S, fetcher: F) -> Self {
        Self {
            bundle_dir,
            store,
            source,
            fetcher,
            in_flight: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Bring the installed bundle up to date with the remote manifest.
    ///
    /// The manifest is saved only after the fetcher reports success, so a
    /// readable manifest always describes the bundle on disk. Cancelling
    /// `cancel` before that point returns `Cancelled` without saving.
    #[instrument(skip_all, fields(bundle = ?self.bundle_dir))]
    pub async fn check_and_sync(&self, cancel: &CancellationToken) -> LauncherResult<SyncOutcome> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| LauncherError::SyncInProgress)?;

        // ── Compare ──
        let installed = self.store.installed_version().await;
        let local_version = installed.clone().unwrap_or_default();

        let remote = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
            remote = self.source.fetch() => remote?,
        };

        // ── Decide ──
        if remote.version == local_version {
            info!("Modpack is up to date ({:?})", local_version);
            return Ok(SyncOutcome::UpToDate {
                version: local_version,
            });
        }
        info!(
            "Modpack update required: {:?} -> {:?}",
            installed, remote.version
        );

        // ── Install ──
        tokio::fs::create_dir_all(&self.bundle_dir)
            .await
            .map_err(|e| LauncherError::io(&self.bundle_dir, e))?;

        let installed_result = self
            .fetcher
            .install(FetchContext {
                destination: &self.bundle_dir,
                locator: &remote.url,
                sha256: remote.sha256.as_deref(),
                cancel,
            })
            .await;
        if let Err(err) = installed_result {
            error!("Modpack install failed, manifest left untouched: {}", err);
            return Err(err);
        }

        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        self.store.save(&remote).await?;
        info!("Modpack updated to {:?}", remote.version);
        if !remote.has_launch_template() {
            warn!("Modpack {:?} ships no launch command yet", remote.version);
        }

        Ok(SyncOutcome::Updated {
            previous: installed,
            current: remote.version,
        })
    }
}
