//! Shared fixtures for command tests

use crate::command::command::{Command, CommandTable, DEFAULT_CATEGORY};
use crate::command::events::{CommandEvent, CommandEventType};
use crate::command::registry::CommandRegistry;
use std::sync::{Arc, Mutex};

/// Table built from bare declarations, no actions attached
pub fn table(declarations: &[&str]) -> CommandTable {
    declarations
        .iter()
        .map(|declaration| {
            let command = Command::new(declaration, "", DEFAULT_CATEGORY);
            (command.name().to_string(), command)
        })
        .collect()
}

/// Registry with a `greet <name>` command that resolves a greeting
pub fn greeting_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .add_command("greet <name>", "Greet someone")
        .option("-l, --loud", "Shout the greeting")
        .option("-t, --times <n>", "Repeat the greeting")
        .action(|args, _, done| {
            let name = args.get("name").unwrap_or("stranger").to_string();
            done.resolve(format!("Hello, {}!", name));
            Ok(None)
        });
    registry
}

/// Event log shared with subscribed handlers
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<(CommandEventType, String)>>>,
}

impl EventLog {
    pub fn record(&self) -> impl Fn(&CommandEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &CommandEvent| {
            let detail = match (&event.result, &event.error) {
                (Some(result), _) => result.to_string(),
                (_, Some(error)) => error.to_string(),
                _ => event.command.clone(),
            };
            events.lock().unwrap().push((event.event_type, detail));
        }
    }

    pub fn types(&self) -> Vec<CommandEventType> {
        self.events.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn details(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, detail)| detail.clone())
            .collect()
    }
}
