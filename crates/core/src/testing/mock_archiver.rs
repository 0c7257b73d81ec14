//! Mock archiver for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::archiver::{ArchiveError, ArchiveSummary, Archiver, ZipArchiver};

/// Mock implementation of the Archiver trait.
///
/// Delegates to [`ZipArchiver`] so archives are real and readable, while
/// recording inputs and allowing a one-shot injected failure.
#[derive(Debug)]
pub struct MockArchiver {
    inner: ZipArchiver,
    calls: Arc<RwLock<Vec<Vec<PathBuf>>>>,
    next_error: Arc<RwLock<Option<ArchiveError>>>,
}

impl Default for MockArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArchiver {
    pub fn new() -> Self {
        Self {
            inner: ZipArchiver::new(),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Configure the next archive call to fail with the given error.
    pub async fn set_next_error(&self, error: ArchiveError) {
        *self.next_error.write().await = Some(error);
    }

    /// Input lists of every archive call, in order.
    pub async fn recorded_calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Archiver for MockArchiver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn archive(
        &self,
        files: &[PathBuf],
        destination: &Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        self.calls.write().await.push(files.to_vec());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.inner.archive(files, destination).await
    }
}
