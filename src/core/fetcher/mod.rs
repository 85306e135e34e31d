// ─── Content Fetcher ───
// Materializes a bundle described by a source locator into a destination
// directory. Content is staged beside the destination and swapped in only
// once it is complete, so a failed fetch never touches the installed bundle.

pub mod archive;
pub mod directory;
pub mod download;
pub mod git;
pub mod locator;

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

pub use locator::{ArchiveKind, Locator};

const DEFAULT_MIN_FREE_DISK_BYTES: u64 = 64 * 1024 * 1024;

/// Everything one install needs.
pub struct FetchContext<'a> {
    /// Directory whose contents are replaced.
    pub destination: &'a Path,
    /// Locator string from the manifest.
    pub locator: &'a str,
    /// Optional archive checksum from the manifest.
    pub sha256: Option<&'a str>,
    pub cancel: &'a CancellationToken,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Replace the contents of `ctx.destination` with the content at
    /// `ctx.locator`. On error the caller must treat the destination as
    /// not updated.
    async fn install(&self, ctx: FetchContext<'_>) -> LauncherResult<()>;
}

/// Default fetcher dispatching on the locator scheme.
pub struct LocatorFetcher {
    client: Client,
    staging_root: PathBuf,
    min_free_bytes: u64,
}

impl LocatorFetcher {
    pub fn new(client: Client, staging_root: PathBuf) -> Self {
        Self {
            client,
            staging_root,
            min_free_bytes: DEFAULT_MIN_FREE_DISK_BYTES,
        }
    }

    pub fn with_min_free_bytes(mut self, bytes: u64) -> Self {
        self.min_free_bytes = bytes;
        self
    }

    async fn materialize(
        &self,
        locator: &Locator,
        stage_dir: &Path,
        content_dir: &Path,
        ctx: &FetchContext<'_>,
    ) -> LauncherResult<()> {
        match locator {
            Locator::RemoteArchive { url, kind } => {
                let archive_path = stage_dir.join("download.bin");
                download::download_to_file(&self.client, url, &archive_path, ctx.sha256, ctx.cancel)
                    .await?;
                let kind = match kind {
                    Some(kind) => *kind,
                    None => archive::sniff_file(&archive_path)?.ok_or_else(|| {
                        LauncherError::UnsupportedLocator(format!(
                            "{} (response is not a zip or tar.gz archive)",
                            ctx.locator
                        ))
                    })?,
                };
                ensure_not_cancelled(ctx.cancel)?;
                ensure_min_disk_space(stage_dir, self.min_free_bytes)?;
                extract_blocking(archive_path, kind, content_dir.to_path_buf()).await
            }
            Locator::LocalArchive { path, kind } => {
                if let Some(expected) = ctx.sha256 {
                    verify_local_checksum(path, expected).await?;
                }
                extract_blocking(path.clone(), *kind, content_dir.to_path_buf()).await
            }
            Locator::LocalDir(path) => {
                let source = path.clone();
                let target = content_dir.to_path_buf();
                let copied = tokio::task::spawn_blocking(move || {
                    directory::copy_dir_recursive(&source, &target)
                })
                .await
                .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
                debug!("Copied {} files from {:?}", copied, path);
                Ok(())
            }
            Locator::Git { url, reference } => {
                git::clone_into(url, reference.as_deref(), content_dir, ctx.cancel).await
            }
        }
    }
}

#[async_trait]
impl ContentFetcher for LocatorFetcher {
    #[instrument(skip(self, ctx), fields(locator = ctx.locator))]
    async fn install(&self, ctx: FetchContext<'_>) -> LauncherResult<()> {
        let locator = Locator::parse(ctx.locator)?;
        let started = Instant::now();

        let stage_dir = self.staging_root.join(Uuid::new_v4().to_string());
        // git refuses to clone into an existing non-empty dir; leave content/ for it to create
        let content_dir = stage_dir.join("content");
        tokio::fs::create_dir_all(&stage_dir)
            .await
            .map_err(|e| LauncherError::io(&stage_dir, e))?;

        let result: LauncherResult<()> = async {
            self.materialize(&locator, &stage_dir, &content_dir, &ctx)
                .await
                .map_err(|err| as_fetch_failure(ctx.locator, err))?;
            ensure_not_cancelled(ctx.cancel)?;
            commit_staged(&content_dir, ctx.destination, &stage_dir.join("previous")).await
        }
        .await;

        if let Err(e) = tokio::fs::remove_dir_all(&stage_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove staging dir {:?}: {}", stage_dir, e);
            }
        }

        match &result {
            Ok(()) => info!(
                "Installed {} into {:?} in {:?}",
                ctx.locator,
                ctx.destination,
                started.elapsed()
            ),
            Err(err) => warn!("Install of {} failed: {}", ctx.locator, err),
        }
        result
    }
}

/// Swap the staged tree into place.
///
/// The current destination is first moved to `backup`, then the staged tree is
/// renamed in. If that second rename fails the backup is moved back, so the
/// previous install survives.
async fn commit_staged(content_dir: &Path, destination: &Path, backup: &Path) -> LauncherResult<()> {
    if !content_dir.exists() {
        tokio::fs::create_dir_all(content_dir)
            .await
            .map_err(|e| LauncherError::io(content_dir, e))?;
    }
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    let had_previous = destination.exists();
    if had_previous {
        tokio::fs::rename(destination, backup)
            .await
            .map_err(|e| LauncherError::io(destination, e))?;
    }

    if let Err(e) = tokio::fs::rename(content_dir, destination).await {
        if had_previous {
            if let Err(restore) = tokio::fs::rename(backup, destination).await {
                error!(
                    "Could not restore previous install from {:?}: {}",
                    backup, restore
                );
            }
        }
        return Err(LauncherError::io(destination, e));
    }

    if had_previous {
        if let Err(e) = tokio::fs::remove_dir_all(backup).await {
            warn!("Could not remove previous install at {:?}: {}", backup, e);
        }
    }
    Ok(())
}

/// Problems reading the source are fetch failures, not local IO faults.
fn as_fetch_failure(locator: &str, err: LauncherError) -> LauncherError {
    match err {
        LauncherError::Io { .. } => LauncherError::Fetch {
            locator: locator.to_string(),
            reason: err.to_string(),
        },
        other => other,
    }
}

async fn extract_blocking(archive: PathBuf, kind: ArchiveKind, dest: PathBuf) -> LauncherResult<()> {
    let started = Instant::now();
    let count = tokio::task::spawn_blocking(move || archive::extract(&archive, kind, &dest))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
    info!("Extraction of {} files finished in {:?}", count, started.elapsed());
    Ok(())
}

async fn verify_local_checksum(path: &Path, expected: &str) -> LauncherResult<()> {
    let owned = path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || download::sha256_file(&owned))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(LauncherError::ChecksumMismatch {
            url: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> LauncherResult<()> {
    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}

fn ensure_min_disk_space(path: &Path, minimum_bytes: u64) -> LauncherResult<()> {
    if minimum_bytes == 0 {
        return Ok(());
    }

    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut best_len = 0usize;
    let mut available = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let len = mount.as_os_str().len();
            if len >= best_len {
                best_len = len;
                available = Some(disk.available_space());
            }
        }
    }

    match available {
        Some(bytes) if bytes < minimum_bytes => Err(LauncherError::Fetch {
            locator: path.display().to_string(),
            reason: format!(
                "not enough free disk space: {} bytes available, {} required",
                bytes, minimum_bytes
            ),
        }),
        _ => Ok(()),
    }
}
