//! Command lifecycle events
//!
//! Every `execute_command` call emits `execute`, and matched commands emit
//! `complete` or `error` once their action settles. Handlers run in
//! subscription order on the emitting task; a panicking handler is logged
//! and does not stop the others.

use crate::command::completion::panic_message;
use crate::core::sync::recover_poison;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::SystemTime;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CommandEventType {
    Execute,
    Complete,
    Error,
}

/// One lifecycle notification
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub event_type: CommandEventType,
    /// Raw input that triggered the event
    pub command: String,
    /// Present on `complete`
    pub result: Option<Value>,
    /// Present on `error`
    pub error: Option<Arc<dyn Error + Send + Sync>>,
    pub timestamp: SystemTime,
}

impl CommandEvent {
    pub fn execute(command: &str) -> Self {
        Self {
            event_type: CommandEventType::Execute,
            command: command.to_string(),
            result: None,
            error: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn complete(command: &str, result: Value) -> Self {
        Self {
            event_type: CommandEventType::Complete,
            command: command.to_string(),
            result: Some(result),
            error: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn error(command: &str, error: Arc<dyn Error + Send + Sync>) -> Self {
        Self {
            event_type: CommandEventType::Error,
            command: command.to_string(),
            result: None,
            error: Some(error),
            timestamp: SystemTime::now(),
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&CommandEvent) + Send + Sync>;

/// Handlers keyed by event type
#[derive(Default)]
pub(crate) struct EventListeners {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<CommandEventType, Vec<(u64, EventHandler)>>>,
}

impl EventListeners {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        event_type: CommandEventType,
        handler: EventHandler,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        recover_poison(self.handlers.lock(), "event listeners")
            .entry(event_type)
            .or_default()
            .push((id, handler));

        Subscription {
            listeners: Arc::downgrade(self),
            event_type,
            id,
        }
    }

    fn unsubscribe(&self, event_type: CommandEventType, id: u64) -> bool {
        let mut handlers = recover_poison(self.handlers.lock(), "event listeners");
        let Some(bucket) = handlers.get_mut(&event_type) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|(handler_id, _)| *handler_id != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            handlers.remove(&event_type);
        }
        removed
    }

    pub(crate) fn count(&self, event_type: CommandEventType) -> usize {
        recover_poison(self.handlers.lock(), "event listeners")
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Deliver to a snapshot of the current handlers, outside the lock
    pub(crate) fn emit(&self, event: &CommandEvent) {
        let snapshot: Vec<EventHandler> = recover_poison(self.handlers.lock(), "event listeners")
            .get(&event.event_type)
            .map(|bucket| bucket.iter().map(|(_, handler)| Arc::clone(handler)).collect())
            .unwrap_or_default();

        for handler in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                log::error!(
                    "Error in {} event handler for '{}': {}",
                    event.event_type,
                    event.command,
                    panic_message(&*payload)
                );
            }
        }
    }
}

/// Handle returned by `CommandRegistry::on`
#[derive(Debug)]
pub struct Subscription {
    listeners: Weak<EventListeners>,
    event_type: CommandEventType,
    id: u64,
}

impl Subscription {
    pub fn event_type(&self) -> CommandEventType {
        self.event_type
    }

    /// Remove the handler; false if it was already gone
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => listeners.unsubscribe(self.event_type, self.id),
            None => false,
        }
    }
}
