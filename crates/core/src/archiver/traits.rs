//! Trait definitions for the archiver module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ArchiveError;

/// Outcome of a successful archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Location of the written archive.
    pub path: PathBuf,
    /// Entry names, in the order they were written.
    pub entries: Vec<String>,
    /// Size of the archive on disk.
    pub bytes: u64,
}

/// Bundles local files into a single archive.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Returns the name of this archiver implementation.
    fn name(&self) -> &str;

    /// Write `files` into a new archive at `destination`.
    ///
    /// Entries are stored flat under each file's base name. The parent of
    /// `destination` is created if missing. On error no archive is left
    /// behind.
    async fn archive(
        &self,
        files: &[PathBuf],
        destination: &Path,
    ) -> Result<ArchiveSummary, ArchiveError>;
}
