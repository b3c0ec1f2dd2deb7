//! Common test utilities and helpers

#![allow(dead_code)]

use pulse_cli::command::api::{CommandEvent, CommandRegistry};
use std::sync::{Arc, Mutex};

/// Registry with a small command set used across integration tests
pub fn sample_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry
        .add_command("greet <name>", "Greet someone")
        .option("-l, --loud", "Shout the greeting")
        .option("-t, --times <n>", "Repeat the greeting")
        .action(|args, _, done| {
            let name = args.get("name").unwrap_or("stranger");
            let times: usize = args
                .option("times")
                .and_then(|value| value.as_str())
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(1);
            let mut greeting = format!("Hello, {}!", name);
            if args.has_option("loud") {
                greeting = greeting.to_uppercase();
            }
            done.resolve(vec![greeting; times].join(" "));
            Ok(None)
        });

    registry
        .add_command_with_category("list users [role]", "List users", "admin")
        .option("-a, --all", "Include disabled users")
        .action(|args, _, done| {
            done.resolve(args.to_json());
            Ok(None)
        });

    registry
        .add_command_with_category("list", "List everything", "admin")
        .action(|_, _, done| {
            done.resolve("everything");
            Ok(None)
        });

    registry
}

/// Shared sink for lifecycle events
pub fn event_sink() -> (
    Arc<Mutex<Vec<CommandEvent>>>,
    impl Fn(&CommandEvent) + Clone + Send + Sync + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: &CommandEvent| {
        sink.lock().unwrap().push(event.clone());
    })
}
