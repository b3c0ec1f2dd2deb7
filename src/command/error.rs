//! Command Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {token}")]
    UnknownCommand { token: String },

    #[error("No action defined for command: {name}")]
    NoAction { name: String },

    #[error("Invalid option declaration '{flags}': no flag token found")]
    InvalidOption { flags: String },

    /// A non-error rejection value, stringified at the event boundary
    #[error("{message}")]
    Thrown { message: String },

    #[error("Action for command '{name}' panicked: {message}")]
    ActionPanicked { name: String, message: String },

    #[error("Command '{command}' finished without resolving or rejecting")]
    Abandoned { command: String },
}

/// Result type for command declaration operations
pub type CommandResult<T> = Result<T, CommandError>;

impl ContextualError for CommandError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            CommandError::UnknownCommand { .. }
                | CommandError::NoAction { .. }
                | CommandError::InvalidOption { .. }
                | CommandError::Thrown { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}
