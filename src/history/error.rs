//! History and storage error types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key '{key}': only letters, digits, '.', '_' and '-' are allowed")]
    InvalidKey { key: String },

    #[error("Storage backend unavailable: {message}")]
    Unavailable { message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Stored history under '{key}' is not a JSON array of strings: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

impl ContextualError for StorageError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StorageError::InvalidKey { .. })
    }

    fn user_message(&self) -> Option<String> {
        match self {
            StorageError::InvalidKey { .. } => Some(self.to_string()),
            _ => None,
        }
    }
}

impl ContextualError for HistoryError {
    fn is_user_actionable(&self) -> bool {
        match self {
            HistoryError::InvalidPattern { .. } => true,
            HistoryError::Decode { .. } => false,
            HistoryError::Storage(error) => error.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            HistoryError::InvalidPattern { .. } => Some(self.to_string()),
            HistoryError::Decode { .. } => None,
            HistoryError::Storage(error) => error.user_message(),
        }
    }
}
