//! Lifecycle event payload tests

use super::utils::greeting_registry;
use crate::command::command::OptionValue;
use crate::command::error::CommandError;
use crate::command::events::{CommandEvent, CommandEventType};
use crate::command::registry::{CommandRegistry, ExecuteOptions};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn capture(registry: &CommandRegistry, event_type: CommandEventType) -> Arc<Mutex<Vec<CommandEvent>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    registry.on(event_type, move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    captured
}

#[tokio::test]
async fn test_complete_event_payload() {
    let mut registry = greeting_registry();
    let executed = capture(&registry, CommandEventType::Execute);
    let completed = capture(&registry, CommandEventType::Complete);

    registry
        .execute_command("  greet Ada  ", ExecuteOptions::default())
        .await
        .unwrap();

    let executed = executed.lock().unwrap();
    let completed = completed.lock().unwrap();
    assert_eq!(executed[0].command, "  greet Ada  ");
    assert!(executed[0].result.is_none() && executed[0].error.is_none());

    assert_eq!(completed[0].event_type, CommandEventType::Complete);
    assert_eq!(completed[0].result, Some(json!("Hello, Ada!")));
    assert!(completed[0].timestamp >= executed[0].timestamp);
}

#[tokio::test]
async fn test_error_event_payload_keeps_error_type() {
    let mut registry = CommandRegistry::new();
    registry.add_command("crash", "").action(|_, _, _| panic!("bad state"));
    let errors = capture(&registry, CommandEventType::Error);

    let _ = registry
        .execute_command("crash", ExecuteOptions::default())
        .await;

    let errors = errors.lock().unwrap();
    let error = errors[0].error.as_ref().unwrap();
    assert!(matches!(
        error.downcast_ref::<CommandError>(),
        Some(CommandError::ActionPanicked { .. })
    ));
    assert!(errors[0].result.is_none());
}

#[tokio::test]
async fn test_panicking_listener_does_not_fail_execution() {
    let mut registry = greeting_registry();
    registry.on(CommandEventType::Complete, |_| panic!("listener failure"));
    let completed = capture(&registry, CommandEventType::Complete);

    let result = registry
        .execute_command("greet Ada -l", ExecuteOptions::default())
        .await;

    assert_eq!(result.unwrap(), json!("Hello, Ada!"));
    assert_eq!(completed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_action_sees_parsed_options() {
    let mut registry = CommandRegistry::new();
    registry
        .add_command("greet <name>", "")
        .option("-l, --loud", "")
        .action(|args, raw, done| {
            let loud = args.option("loud") == Some(&OptionValue::Flag);
            done.resolve(json!({"raw": raw, "loud": loud}));
            Ok(None)
        });

    let result = registry
        .execute_command("greet Ada --loud", ExecuteOptions::default())
        .await
        .unwrap();
    assert_eq!(result, json!({"raw": "greet Ada --loud", "loud": true}));
}
