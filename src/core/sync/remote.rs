use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::ModpackManifest;

pub const DEFAULT_MANIFEST_URL: &str = "https://archive.hicz.net/geccopack/manifest.json";
const MANIFEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the authoritative manifest comes from.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self) -> LauncherResult<ModpackManifest>;
}

/// Remote manifest served over HTTP(S) at a fixed URL.
pub struct HttpManifestSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpManifestSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: MANIFEST_REQUEST_TIMEOUT,
        }
    }

    /// Whole-request deadline for the manifest GET.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(&self) -> LauncherResult<ModpackManifest> {
        info!("Fetching modpack manifest from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let manifest = ModpackManifest::from_json(&body, "remote manifest")?;
        info!("Remote modpack version is {:?}", manifest.version);
        Ok(manifest)
    }
}
