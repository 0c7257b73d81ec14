pub mod actor;
pub mod archiver;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod task;
pub mod testing;

pub use actor::{Actor, ActorError, ActorStats};
pub use archiver::{ArchiveError, ArchiveSummary, Archiver, ZipArchiver};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, Mode, ServerConfig,
};
pub use fetcher::{FetchError, FetchedFile, Fetcher, FetcherConfig, HttpFetcher};
pub use orchestrator::{
    ArchiveFile, OrchestratorConfig, OrchestratorError, OrchestratorStatus, TaskOrchestrator,
    TaskStatusReport,
};
pub use task::{FileError, Task, TaskError, TaskSnapshot, TaskState};
