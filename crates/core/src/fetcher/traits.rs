//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::FetchError;

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// The URL that was fetched.
    pub url: String,
    /// Where the body was written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Fetches a remote resource into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetch `url` and write its body to `destination`.
    ///
    /// Parent directories are created as needed. On error no file is left
    /// at `destination`. Dropping the returned future aborts the transfer.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchedFile, FetchError>;
}
