//! Task entity: a capacity-bounded list of URLs with a forward-only
//! lifecycle (`Pending -> Processing -> Completed | Failed`) and a log of
//! per-URL failures.

mod entity;
mod types;

pub use entity::Task;
pub use types::{FileError, TaskError, TaskSnapshot, TaskState};
