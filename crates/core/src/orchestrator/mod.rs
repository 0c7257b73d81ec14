//! Task orchestrator.
//!
//! Tasks move through a fixed lifecycle:
//! - **Admission**: a task is registered only while fewer than `max_tasks` exist
//! - **Collection**: URLs are appended until the task holds `max_files`
//! - **Processing**: every URL is fetched, the survivors are zipped
//! - **Cleanup**: after `cleanup_delay_secs` the task's files and entry go away
//!
//! Registry commands are serialized through one actor; processing and
//! cleanup run as background tasks.

mod cleanup;
mod commands;
mod config;
mod pipeline;
mod registry;
mod runner;
mod types;

pub use commands::{Reply, TaskAction, TaskCommand};
pub use config::OrchestratorConfig;
pub use registry::TaskRegistry;
pub use runner::{ArchiveFile, TaskOrchestrator};
pub use types::{OrchestratorError, OrchestratorStatus, TaskStatusReport};
