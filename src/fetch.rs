//! Remote image sources: address validation and download to a local file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Url};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::{Error, Result};

const FALLBACK_FILE_NAME: &str = "download";

/// Accepts only absolute `http`/`https` URLs with a host.
pub fn parse_remote_address(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let invalid = || Error::InvalidAddress(trimmed.to_string());
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Local file a download of `url` is written to: the URL's last path
/// segment inside `dir`. Repeated downloads of the same name overwrite.
pub fn download_target(url: &Url, dir: &Path) -> PathBuf {
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILE_NAME);
    dir.join(name)
}

/// Bounds on a single download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Duration,
    /// Largest body accepted, in bytes.
    pub max_bytes: u64,
}

impl From<&Configuration> for FetchLimits {
    fn from(cfg: &Configuration) -> Self {
        Self {
            timeout: cfg.fetch_timeout,
            max_bytes: cfg.max_download_bytes,
        }
    }
}

/// Downloads `url` into `dir`.
///
/// The body is streamed to a `.part` file next to the target and renamed
/// once complete, so a failed or oversized download never leaves a file
/// under the target name.
pub async fn fetch_remote(
    client: &Client,
    url: &Url,
    dir: &Path,
    limits: FetchLimits,
) -> Result<PathBuf> {
    let target = download_target(url, dir);
    let partial = partial_path(&target);
    let address = url.to_string();
    let network = |reason: String| Error::Network {
        address: address.clone(),
        reason,
    };
    let too_large = || network(format!("larger than {} bytes", limits.max_bytes));
    debug!(url = %address, target = %target.display(), "downloading");

    let download = async {
        let mut response = client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| network(e.to_string()))?;
        if response
            .content_length()
            .is_some_and(|len| len > limits.max_bytes)
        {
            return Err(too_large());
        }

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| network(e.to_string()))?;
        let mut file = File::create(&partial)
            .await
            .map_err(|e| network(e.to_string()))?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| network(e.to_string()))?
        {
            written += chunk.len() as u64;
            if written > limits.max_bytes {
                return Err(too_large());
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| network(e.to_string()))?;
        }
        file.flush().await.map_err(|e| network(e.to_string()))?;
        drop(file);
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|e| network(e.to_string()))?;
        Ok::<u64, Error>(written)
    };

    let outcome = tokio::time::timeout(limits.timeout, download).await;
    let result = match outcome {
        Ok(Ok(len)) => {
            info!(url = %address, bytes = len, target = %target.display(), "downloaded image");
            return Ok(target);
        }
        Ok(Err(err)) => err,
        Err(_) => network(format!(
            "timed out after {}",
            humantime::format_duration(limits.timeout)
        )),
    };
    if let Err(err) = tokio::fs::remove_file(&partial).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %partial.display(), "failed to remove partial download: {err}");
        }
    }
    Err(result)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}
