//! Archiver module for bundling fetched files.
//!
//! [`ZipArchiver`] writes a single-level zip with deflate compression; each
//! input is stored under its base name.

mod error;
mod traits;
mod zip_archiver;

pub use error::ArchiveError;
pub use traits::{ArchiveSummary, Archiver};
pub use zip_archiver::ZipArchiver;
