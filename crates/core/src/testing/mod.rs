//! Testing utilities and mock implementations.
//!
//! Mocks for the fetcher and archiver seams, so the orchestrator can be
//! driven end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use fetchpack_core::testing::{MockArchiver, MockFetcher};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher.fail_with_status("http://example.com/missing.jpg", 404).await;
//!
//! let orchestrator = TaskOrchestrator::new(config, fetcher.clone(), Arc::new(MockArchiver::new()));
//! ```

mod mock_archiver;
mod mock_fetcher;

pub use mock_archiver::MockArchiver;
pub use mock_fetcher::{MockFetcher, RecordedFetch};
