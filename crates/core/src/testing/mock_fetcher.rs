//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchedFile, Fetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    pub destination: PathBuf,
    pub success: bool,
}

#[derive(Debug, Clone)]
enum Failure {
    Status(u16),
    Transport(String),
    TooLarge(u64),
}

impl Failure {
    fn to_error(&self) -> FetchError {
        match self {
            Failure::Status(status) => FetchError::Status { status: *status },
            Failure::Transport(message) => FetchError::Transport(message.clone()),
            Failure::TooLarge(max) => FetchError::TooLarge {
                size: max + 1,
                max: *max,
            },
        }
    }
}

/// Mock implementation of the Fetcher trait.
///
/// Writes a small deterministic body for every URL unless told otherwise:
/// - Per-URL failures (HTTP status, transport error, size ceiling)
/// - Optional extension allowlist, checked before anything is written
/// - Artificial delay per fetch
/// - Records every call
#[derive(Debug)]
pub struct MockFetcher {
    failures: Arc<RwLock<HashMap<String, Failure>>>,
    allowed_extensions: Arc<RwLock<Option<Vec<String>>>>,
    delay: Arc<RwLock<Duration>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            failures: Arc::new(RwLock::new(HashMap::new())),
            allowed_extensions: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            fetches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Body written for `url` on success.
    pub fn body_for(url: &str) -> Vec<u8> {
        format!("content of {}", url).into_bytes()
    }

    /// Make fetches of `url` fail with an HTTP status.
    pub async fn fail_with_status(&self, url: &str, status: u16) {
        self.failures
            .write()
            .await
            .insert(url.to_string(), Failure::Status(status));
    }

    /// Make fetches of `url` fail at the transport level.
    pub async fn fail_with_transport(&self, url: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(url.to_string(), Failure::Transport(message.to_string()));
    }

    /// Make fetches of `url` exceed a size ceiling of `max` bytes.
    pub async fn fail_too_large(&self, url: &str, max: u64) {
        self.failures
            .write()
            .await
            .insert(url.to_string(), Failure::TooLarge(max));
    }

    /// Only accept destinations with these extensions (e.g. `[".jpg", "pdf"]`).
    pub async fn set_allowed_extensions(&self, extensions: &[&str]) {
        let normalized = extensions
            .iter()
            .map(|ext| crate::fetcher::normalize_extension(ext))
            .collect();
        *self.allowed_extensions.write().await = Some(normalized);
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    async fn attempt(&self, url: &str, destination: &Path) -> Result<FetchedFile, FetchError> {
        if let Some(allowed) = self.allowed_extensions.read().await.as_ref() {
            let extension = destination
                .extension()
                .and_then(|ext| ext.to_str())
                .map(crate::fetcher::normalize_extension)
                .unwrap_or_default();
            if !allowed.contains(&extension) {
                return Err(FetchError::UnsupportedType {
                    extension: format!(".{}", extension),
                });
            }
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failures.read().await.get(url) {
            return Err(failure.to_error());
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = Self::body_for(url);
        tokio::fs::write(destination, &body).await?;

        Ok(FetchedFile {
            url: url.to_string(),
            path: destination.to_path_buf(),
            bytes: body.len() as u64,
        })
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedFile, FetchError> {
        let result = self.attempt(url, destination).await;

        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            success: result.is_ok(),
        });

        result
    }
}
