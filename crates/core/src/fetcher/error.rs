//! Error types for the fetcher module.

use thiserror::Error;

/// Errors that can occur while fetching a single remote file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or has an unsupported scheme.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The destination extension is not on the allowlist.
    #[error("extension is not allowed: {extension}")]
    UnsupportedType { extension: String },

    /// The remote file exceeds the size ceiling.
    #[error("file too large: {size} bytes (limit {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// The server answered with a non-success status.
    #[error("failed to download: HTTP {status}")]
    Status { status: u16 },

    /// The request failed before a response body was read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The fetch did not finish within its time budget.
    #[error("fetch timed out")]
    Timeout,

    /// The fetch was abandoned because the service is shutting down.
    #[error("fetch cancelled")]
    Cancelled,

    /// Writing the file to local storage failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::UnsupportedType { .. } => "unsupported_type",
            FetchError::TooLarge { .. } => "too_large",
            FetchError::Status { .. } => "status",
            FetchError::Transport(_) => "transport",
            FetchError::Timeout => "timeout",
            FetchError::Cancelled => "cancelled",
            FetchError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
