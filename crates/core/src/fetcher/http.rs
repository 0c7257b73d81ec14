//! HTTP fetcher backed by reqwest.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::config::{normalize_extension, FetcherConfig};
use super::error::FetchError;
use super::traits::{FetchedFile, Fetcher};

/// Name used when a URL has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "download";

/// Fetches files over HTTP(S), enforcing an extension allowlist and a size
/// ceiling.
pub struct HttpFetcher {
    client: Client,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl HttpFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            allowed_extensions: config.normalized_extensions(),
            max_file_size: config.max_file_size_bytes(),
        })
    }

    /// Check the destination's extension against the allowlist.
    pub fn check_extension(&self, destination: &Path) -> Result<(), FetchError> {
        let extension = destination
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_extension)
            .unwrap_or_default();

        if !extension.is_empty() && self.allowed_extensions.contains(&extension) {
            Ok(())
        } else {
            Err(FetchError::UnsupportedType {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", extension)
                },
            })
        }
    }

    async fn write_body(
        &self,
        response: &mut Response,
        destination: &Path,
    ) -> Result<u64, FetchError> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(destination).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > self.max_file_size {
                return Err(FetchError::TooLarge {
                    size: written,
                    max: self.max_file_size,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedFile, FetchError> {
        self.check_extension(destination)?;

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        debug!("Fetching {} into {:?}", url, destination);
        let mut response = self.client.get(parsed).send().await?;

        if let Some(length) = response.content_length() {
            if length > self.max_file_size {
                return Err(FetchError::TooLarge {
                    size: length,
                    max: self.max_file_size,
                });
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        match self.write_body(&mut response, destination).await {
            Ok(bytes) => {
                debug!("Fetched {} ({} bytes)", url, bytes);
                Ok(FetchedFile {
                    url: url.to_string(),
                    path: destination.to_path_buf(),
                    bytes,
                })
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Failed to remove partial file {:?}: {}",
                            destination, remove_err
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

/// Derive a local file name from the last path segment of a URL.
///
/// Query strings and fragments are ignored. Falls back to `"download"` when
/// the URL has no usable segment.
pub fn file_name_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    match segment {
        Some(name) if !name.is_empty() && name != "." && name != ".." => {
            name.replace(['\\', ':'], "_")
        }
        _ => FALLBACK_FILE_NAME.to_string(),
    }
}
