//! Public API for command history
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::history::error::{HistoryError, HistoryResult, StorageError, StorageResult};
pub use crate::history::history::{
    CommandHistory, HistoryOptions, DEFAULT_MAX_SIZE, DEFAULT_STORAGE_KEY,
};
pub use crate::history::storage::{FileStorage, MemoryStorage, StorageAdapter};
