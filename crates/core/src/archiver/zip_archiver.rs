//! Zip archiver using deflate compression.

use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::ArchiveError;
use super::traits::{ArchiveSummary, Archiver};

/// Writes flat zip archives on the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    fn name(&self) -> &str {
        "zip"
    }

    async fn archive(
        &self,
        files: &[PathBuf],
        destination: &Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        if files.is_empty() {
            return Err(ArchiveError::NoInputs);
        }

        let inputs = files.to_vec();
        let dest = destination.to_path_buf();
        let result = tokio::task::spawn_blocking(move || write_zip(&inputs, &dest))
            .await
            .map_err(|e| ArchiveError::Join(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(summary) => {
                debug!(
                    "Wrote archive {:?} ({} entries, {} bytes)",
                    summary.path,
                    summary.entries.len(),
                    summary.bytes
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        warn!(
                            "Failed to remove partial archive {:?}: {}",
                            destination, remove_err
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

fn write_zip(files: &[PathBuf], destination: &Path) -> Result<ArchiveSummary, ArchiveError> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(File::create(destination)?);
    let mut entries = Vec::with_capacity(files.len());

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveError::InvalidSource { path: path.clone() })?;

        let mut source = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::SourceNotFound { path: path.clone() },
            _ => ArchiveError::Io(e),
        })?;
        let size = source.metadata()?.len();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u32::MAX as u64);

        writer.start_file(name.as_str(), options)?;
        io::copy(&mut source, &mut writer)?;
        entries.push(name);
    }

    let file = writer.finish()?;
    let bytes = file.metadata()?.len();

    Ok(ArchiveSummary {
        path: destination.to_path_buf(),
        entries,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_archive_writes_flat_entries() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("downloads").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let a = write_file(&nested, "a.jpg", b"first file");
        let b = write_file(temp_dir.path(), "b.pdf", &[7u8; 4096]);
        let destination = temp_dir.path().join("out").join("archive.zip");

        let summary = ZipArchiver::new()
            .archive(&[a, b], &destination)
            .await
            .unwrap();

        assert_eq!(summary.entries, vec!["a.jpg", "b.pdf"]);
        assert!(summary.bytes > 0);
        assert!(destination.exists());

        let mut zip = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);

        let mut entry = zip.by_name("a.jpg").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "first file");
        drop(entry);

        let entry = zip.by_name("b.pdf").unwrap();
        assert_eq!(entry.size(), 4096);
    }

    #[tokio::test]
    async fn test_archive_missing_source_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let present = write_file(temp_dir.path(), "present.jpg", b"ok");
        let missing = temp_dir.path().join("missing.jpg");
        let destination = temp_dir.path().join("archive.zip");

        let result = ZipArchiver::new()
            .archive(&[present, missing], &destination)
            .await;

        assert!(matches!(result, Err(ArchiveError::SourceNotFound { .. })));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_archive_requires_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("archive.zip");

        let result = ZipArchiver::new().archive(&[], &destination).await;
        assert!(matches!(result, Err(ArchiveError::NoInputs)));
        assert!(!destination.exists());
    }
}
