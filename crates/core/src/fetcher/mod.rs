//! Fetcher module for downloading remote files into local storage.
//!
//! The [`Fetcher`] trait abstracts a single "URL to local file" transfer;
//! [`HttpFetcher`] is the reqwest-backed implementation. It enforces:
//!
//! - an extension allowlist, checked on the destination before any request
//! - a byte-size ceiling, checked on `Content-Length` and while streaming
//! - a whole-request timeout on the HTTP client
//!
//! On any error the partially written file is removed.

mod config;
mod error;
mod http;
mod traits;

pub(crate) use config::normalize_extension;
pub use config::FetcherConfig;
pub use error::FetchError;
pub use http::{file_name_from_url, HttpFetcher};
pub use traits::{FetchedFile, Fetcher};
