use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// Stream `url` into `dest`, hashing as it goes.
///
/// When `sha256_expected` is set the digest is compared once the body is
/// complete. Returns the number of bytes written.
pub async fn download_to_file(
    client: &Client,
    url: &Url,
    dest: &Path,
    sha256_expected: Option<&str>,
    cancel: &CancellationToken,
) -> LauncherResult<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total_bytes = response.content_length();
    info!("Downloading {} ({:?} bytes)", url, total_bytes);

    let mut hasher = Sha256::new();
    let mut written = 0u64;
    {
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;

        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
                next = stream.next() => match next {
                    Some(chunk) => chunk?,
                    None => break,
                },
            };
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            written = written.saturating_add(chunk.len() as u64);
        }

        file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
        // handle dropped here so the archive can be reopened for extraction
    }

    if let Some(expected) = sha256_expected {
        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(LauncherError::ChecksumMismatch {
                url: url.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
    Ok(written)
}

/// Hex SHA-256 of a file on disk.
pub fn sha256_file(path: &Path) -> LauncherResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| LauncherError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| LauncherError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}
