// tasklist - single-user task list with pluggable key-value persistence

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod persist;
pub mod record;
pub mod render;
pub mod store;

// Re-export main types for convenience
pub use backend::{Backend, FileBackend, MemoryBackend, SqliteBackend};
pub use error::{BackendError, StoreError};
pub use filter::{FilterMode, Query, UndatedPlacement, view};
pub use record::{NewTask, Priority, Task, TaskId};
pub use store::{RemoveOutcome, Stats, TaskStore};
