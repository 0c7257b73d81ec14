//! Error types for the archiver module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No input files were given.
    #[error("no files to archive")]
    NoInputs,

    /// An input file does not exist.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// An input path has no file name component.
    #[error("Invalid source path: {path}")]
    InvalidSource { path: PathBuf },

    /// Filesystem error while reading inputs or writing the archive.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip writer rejected an entry.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking writer task panicked or was cancelled.
    #[error("archive task failed: {0}")]
    Join(String),
}
