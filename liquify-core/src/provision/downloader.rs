//! Async file downloader with URL validation and checksum verification.
//!
//! Downloads stream the response body straight to disk with reqwest while
//! computing a SHA256 digest. The [`Fetcher`] trait is the seam the
//! provisioner downloads through, so tests can count or fake requests.

use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid download URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to download {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Download of {url} failed with status {status}: {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },
    #[error("Failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SHA256 checksum mismatch for {url}\nExpected: {expected}\nActual: {actual}")]
    Checksum {
        url: String,
        expected: String,
        actual: String,
    },
}

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL can be fetched.
///
/// Checks:
/// - URL parses
/// - URL scheme is HTTP or HTTPS
/// - URL has a host
fn validate_url(url_str: &str) -> Result<Url, DownloadError> {
    let invalid = |reason: &str| DownloadError::InvalidUrl {
        url: url_str.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(url_str).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }

    if url.host_str().is_none() {
        return Err(invalid("URL must have a host"));
    }

    Ok(url)
}

// ============================================================================
// Fetcher
// ============================================================================

/// Retrieves a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `url` into `dest`, overwriting any existing file.
    ///
    /// Returns the number of bytes written. When `expected_sha256` is given
    /// (lowercase hex) and the body does not match, the file is removed and
    /// [`DownloadError::Checksum`] is returned.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<u64, DownloadError>;
}

/// Plain HTTP(S) GET fetcher backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, custom roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<u64, DownloadError> {
        let parsed = validate_url(url)?;

        let io_err = |source: std::io::Error| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| DownloadError::Request {
                url: url.to_string(),
                source,
            })?;

        // No file is created for a failed request
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            });
        }

        debug!("Content-Length: {:?}", response.content_length());

        let mut file = File::create(dest).await.map_err(io_err)?;

        // Stream the response body while computing SHA256
        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;
        let mut hasher = Sha256::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|source| DownloadError::Request {
                url: url.to_string(),
                source,
            })?;

            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(io_err)?;
            bytes_downloaded += chunk.len() as u64;
        }

        file.flush().await.map_err(io_err)?;

        if let Some(expected) = expected_sha256 {
            let actual = format_sha256_hex(&hasher.finalize());

            if actual != expected.to_lowercase() {
                // Delete the corrupted file
                let _ = tokio::fs::remove_file(dest).await;
                return Err(DownloadError::Checksum {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
            debug!("SHA256 verified: {}", actual);
        }

        Ok(bytes_downloaded)
    }
}

/// Formats a SHA256 hash as lowercase hex.
fn format_sha256_hex(hash: &[u8]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}
