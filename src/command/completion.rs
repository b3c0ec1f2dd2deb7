//! Settle-once completion protocol shared by command actions and the
//! unknown-command handler.
//!
//! A [`Completion`] is the pair of `resolve`/`reject` callbacks handed to an
//! action. Clones share one slot, the first settlement wins and later calls
//! are ignored. The executing side waits on the matching [`Settled`] half.

use crate::command::error::CommandError;
use crate::core::sync::recover_poison;
use serde_json::Value;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Outcome of one command invocation
pub type Settlement = Result<Value, Rejection>;

/// Why a command invocation failed
///
/// Either an error object or an arbitrary value, mirroring what an action
/// may reject with. Callers of `Command::execute` receive it unchanged;
/// the registry only normalises it when building `error` events.
#[derive(Clone, Debug)]
pub enum Rejection {
    Error(Arc<dyn Error + Send + Sync>),
    Value(Value),
}

impl Rejection {
    pub fn error<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Rejection::Error(Arc::new(error))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Rejection::Value(value.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Rejection::Error(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Rejection::Value(value) => Some(value),
            Rejection::Error(_) => None,
        }
    }

    /// Downcast an error rejection to a concrete error type
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Rejection::Error(error) => error.downcast_ref::<E>(),
            Rejection::Value(_) => None,
        }
    }

    /// Error object for event subscribers; plain values are stringified
    pub fn normalize(&self) -> Arc<dyn Error + Send + Sync> {
        match self {
            Rejection::Error(error) => Arc::clone(error),
            Rejection::Value(value) => Arc::new(CommandError::Thrown {
                message: stringify_value(value),
            }),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Error(error) => write!(f, "{}", error),
            Rejection::Value(value) => write!(f, "{}", stringify_value(value)),
        }
    }
}

impl From<CommandError> for Rejection {
    fn from(error: CommandError) -> Self {
        Rejection::error(error)
    }
}

impl From<Value> for Rejection {
    fn from(value: Value) -> Self {
        Rejection::Value(value)
    }
}

impl From<&str> for Rejection {
    fn from(message: &str) -> Self {
        Rejection::Value(Value::String(message.to_string()))
    }
}

impl From<String> for Rejection {
    fn from(message: String) -> Self {
        Rejection::Value(Value::String(message))
    }
}

/// Plain-text form of a rejection value
///
/// Strings are used as-is, arrays are joined with commas (`null` elements
/// become empty), objects collapse to `[object Object]`.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

/// Resolve/reject handle given to actions and unknown-command handlers
#[derive(Clone)]
pub struct Completion {
    slot: Arc<Mutex<Option<oneshot::Sender<Settlement>>>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Completion {
    pub(crate) fn channel() -> (Self, Settled) {
        let (sender, receiver) = oneshot::channel();
        let completion = Self {
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        (completion, Settled { receiver })
    }

    /// Fulfil the invocation; returns false if it was already settled
    pub fn resolve(&self, value: impl Into<Value>) -> bool {
        self.settle(Ok(value.into()))
    }

    /// Fail the invocation; returns false if it was already settled
    pub fn reject(&self, reason: impl Into<Rejection>) -> bool {
        self.settle(Err(reason.into()))
    }

    pub fn is_settled(&self) -> bool {
        recover_poison(self.slot.lock(), "completion slot").is_none()
    }

    fn settle(&self, outcome: Settlement) -> bool {
        let sender = recover_poison(self.slot.lock(), "completion slot").take();
        match sender {
            Some(sender) => {
                // The waiting side may already be gone; the settlement still counts
                let _ = sender.send(outcome);
                true
            }
            None => {
                log::trace!("Ignoring settlement of an already settled command");
                false
            }
        }
    }
}

/// Waiting half of a [`Completion`]
pub(crate) struct Settled {
    receiver: oneshot::Receiver<Settlement>,
}

impl Settled {
    /// Wait for the first settlement
    ///
    /// If every `Completion` clone is dropped unsettled the invocation fails
    /// with `CommandError::Abandoned` instead of waiting forever.
    pub(crate) async fn wait(self, command: String) -> Settlement {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CommandError::Abandoned { command }.into()),
        }
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let (completion, settled) = Completion::channel();
        let other = completion.clone();

        assert!(completion.resolve("first"));
        assert!(!other.reject("second"));
        assert!(other.is_settled());

        let outcome = settled.wait("test".to_string()).await;
        assert_eq!(outcome.unwrap(), json!("first"));
    }

    #[tokio::test]
    async fn test_dropped_completion_is_abandoned() {
        let (completion, settled) = Completion::channel();
        drop(completion);

        let rejection = settled.wait("sleep 5".to_string()).await.unwrap_err();
        assert_eq!(
            rejection.downcast_ref::<CommandError>(),
            Some(&CommandError::Abandoned {
                command: "sleep 5".to_string()
            })
        );
    }

    #[test]
    fn test_stringify_value_follows_plain_text_rules() {
        assert_eq!(stringify_value(&json!("boom")), "boom");
        assert_eq!(stringify_value(&json!(42)), "42");
        assert_eq!(stringify_value(&json!(null)), "null");
        assert_eq!(stringify_value(&json!([1, null, "a"])), "1,,a");
        assert_eq!(stringify_value(&json!({"code": 1})), "[object Object]");
    }

    #[test]
    fn test_normalize_wraps_plain_values_only() {
        let value = Rejection::from("bad input");
        assert!(!value.is_error());
        assert_eq!(value.normalize().to_string(), "bad input");

        let error = Rejection::from(CommandError::NoAction {
            name: "greet".to_string(),
        });
        assert!(error.is_error());
        assert_eq!(
            error.normalize().to_string(),
            "No action defined for command: greet"
        );
    }
}
