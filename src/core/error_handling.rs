//! Generic error handling utilities
//!
//! Lets the host report any engine error at the right level of detail:
//! user-actionable failures (an unknown command, a malformed declaration)
//! show their own message, system failures (storage I/O) show the operation
//! context and keep the detail at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if the message should be shown to the user verbatim
    fn is_user_actionable(&self) -> bool;

    /// The message to show when the error is user-actionable
    fn user_message(&self) -> Option<String>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use pulse_cli::core::error_handling::log_error_with_context;
/// # use pulse_cli::command::api::CommandError;
/// let error = CommandError::UnknownCommand { token: "gret".to_string() };
/// log_error_with_context(&error, "Command dispatch");
/// // Logs: "FATAL: Unknown command: gret"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
