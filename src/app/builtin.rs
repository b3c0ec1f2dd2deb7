//! Commands shipped with the interactive host
//!
//! Commands that inspect the registry itself (help, history) receive a weak
//! handle to the shared registry. Their actions run while the caller still
//! holds the registry lock, so they return a future that takes the lock once
//! the dispatch has finished and settles through the completion from there.

use crate::app::display;
use crate::command::api::{ActionResult, CommandArgs, CommandRegistry, Completion, Rejection, UNLISTED_CATEGORY};
use crate::core::logging::reconfigure_logging;
use futures::future::FutureExt;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;

/// Registry shared between the host loop and registry-aware commands
pub type SharedRegistry = Arc<Mutex<CommandRegistry>>;

/// Upper bound for the `sleep` command
const MAX_SLEEP_MS: u64 = 60_000;

/// Upper bound for `echo --repeat`
const MAX_REPEAT: usize = 1_000;

/// Session flags the host loop polls between commands
#[derive(Debug, Clone, Default)]
pub struct Session {
    exit_requested: Arc<AtomicBool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

/// Run `work` against the registry after the current dispatch releases it
fn with_registry<F, Fut>(registry: &Weak<Mutex<CommandRegistry>>, done: Completion, work: F) -> ActionResult
where
    F: FnOnce(SharedRegistry, Completion) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), Rejection>> + Send + 'static,
{
    let Some(shared) = registry.upgrade() else {
        return Err(Rejection::from("Command registry is no longer available"));
    };
    Ok(Some(
        async move {
            work(shared, done).await?;
            Ok::<Value, Rejection>(Value::Null)
        }
        .boxed(),
    ))
}

fn parse_count(args: &CommandArgs, option: &str) -> Result<Option<usize>, Rejection> {
    match args.option(option).and_then(|value| value.as_str()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Rejection::from(format!("--{} expects a number, got '{}'", option, raw))),
    }
}

/// Everything typed after `help`, quotes removed; `None` when empty
fn help_topic(raw: &str) -> Option<String> {
    let topic = raw
        .split_whitespace()
        .skip(1)
        .map(|word| word.trim_matches(['"', '\'']))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!topic.is_empty()).then_some(topic)
}

/// Register the host's commands and unknown-command handler
pub fn register_builtins(
    registry: &mut CommandRegistry,
    shared: &SharedRegistry,
    session: &Session,
    color: bool,
) {
    register_general(registry, Arc::downgrade(shared), session, color);
    register_history(registry, Arc::downgrade(shared), color);
    register_diagnostics(registry);
    register_unknown_handler(registry, Arc::downgrade(shared));
}

fn register_general(
    registry: &mut CommandRegistry,
    weak: Weak<Mutex<CommandRegistry>>,
    session: &Session,
    color: bool,
) {
    registry
        .add_command("help [command]", "Show available commands")
        .action(move |_, raw, done| {
            let topic = help_topic(raw);
            with_registry(&weak, done, move |shared, done| async move {
                let registry = shared.lock().await;
                let text = match topic {
                    None => display::render_help(&registry.help_sections(), color),
                    // Multi-word names resolve longest first, as for input lines
                    Some(topic) => match registry.parse_command(&topic).command {
                        Some(command) => format!(
                            "{}\n  {}\n  usage: {}",
                            command.signature(),
                            command.description(),
                            command.usage_example()
                        ),
                        None => return Err(Rejection::from(format!("No help for '{}'", topic))),
                    },
                };
                done.resolve(text);
                Ok::<(), Rejection>(())
            })
        });

    registry
        .add_command("echo <text>", "Print text back")
        .option("-u, --upper", "Convert to upper case")
        .option("-r, --repeat <n>", "Print the text n times")
        .action(|args, _, done| {
            let mut text = args.get("text").unwrap_or_default().to_string();
            if args.has_option("upper") {
                text = text.to_uppercase();
            }
            let repeat = parse_count(&args, "repeat")?.unwrap_or(1);
            if repeat > MAX_REPEAT {
                return Err(Rejection::from(format!(
                    "--repeat must be at most {}, got {}",
                    MAX_REPEAT, repeat
                )));
            }
            done.resolve(vec![text; repeat].join("\n"));
            Ok(None)
        });

    registry
        .add_command("greet <name> [greeting]", "Greet someone")
        .option("-l, --loud", "Shout the greeting")
        .option("-t, --tag <label>", "Label the greeting (repeatable)")
        .action(|args, _, done| {
            let greeting = args.get("greeting").unwrap_or("Hello");
            let name = args.get("name").unwrap_or("stranger");
            let mut text = format!("{}, {}!", greeting, name);
            if args.has_option("loud") {
                text = text.to_uppercase();
            }
            if let Some(tags) = args.option("tag") {
                text = format!("{} [{}]", text, tags.values().join(", "));
            }
            done.resolve(text);
            Ok(None)
        });

    registry
        .add_command("sleep <ms>", "Resolve after a delay")
        .action(|args, _, done| {
            let raw = args.get("ms").unwrap_or_default();
            let ms: u64 = raw
                .parse()
                .map_err(|_| Rejection::from(format!("Not a duration in milliseconds: '{}'", raw)))?;
            let ms = ms.min(MAX_SLEEP_MS);
            Ok(Some(
                async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    done.resolve(json!({ "slept_ms": ms }));
                    Ok(Value::Null)
                }
                .boxed(),
            ))
        });

    let exit_session = session.clone();
    registry
        .add_command("exit", "Leave the session")
        .action(move |_, _, done| {
            exit_session.request_exit();
            done.resolve(Value::Null);
            Ok(None)
        });
}

fn register_history(registry: &mut CommandRegistry, weak: Weak<Mutex<CommandRegistry>>, color: bool) {
    let list_weak = weak.clone();
    registry
        .add_command_with_category("history", "List previous commands", "history")
        .option("-n, --limit <n>", "Show only the newest n entries")
        .action(move |args, _, done| {
            let limit = parse_count(&args, "limit")?;
            with_registry(&list_weak, done, move |shared, done| async move {
                let entries = shared.lock().await.history().get_all();
                let skip = limit.map_or(0, |limit| entries.len().saturating_sub(limit));
                done.resolve(display::render_history(&entries[skip..], color));
                Ok::<(), Rejection>(())
            })
        });

    let search_weak = weak.clone();
    registry
        .add_command_with_category(
            "history search <pattern>",
            "Find previous commands matching a regular expression",
            "history",
        )
        .action(move |args, _, done| {
            let pattern = args.get("pattern").unwrap_or_default().to_string();
            with_registry(&search_weak, done, move |shared, done| async move {
                let matches = shared
                    .lock()
                    .await
                    .history()
                    .search(&pattern)
                    .map_err(Rejection::error)?;
                done.resolve(display::render_history(&matches, color));
                Ok::<(), Rejection>(())
            })
        });

    registry
        .add_command_with_category("clear history", "Forget all previous commands", "history")
        .action(move |_, _, done| {
            with_registry(&weak, done, |shared, done| async move {
                let mut registry = shared.lock().await;
                registry.history_mut().clear();
                registry.history().flush().await;
                done.resolve("History cleared");
                Ok::<(), Rejection>(())
            })
        });
}

fn register_diagnostics(registry: &mut CommandRegistry) {
    registry
        .add_command_with_category("log level <level>", "Change the log level", UNLISTED_CATEGORY)
        .action(|args, _, done| {
            let level = args.get("level").unwrap_or_default();
            match reconfigure_logging(level) {
                Ok(()) => {
                    log::info!("Log level set to '{}'", level);
                    done.resolve(format!("Log level set to '{}'", level));
                }
                Err(e) => {
                    done.reject(format!("Could not set log level '{}': {}", level, e));
                }
            }
            Ok(None)
        });

    registry
        .add_command_with_category("fail [message]", "Reject with a message", UNLISTED_CATEGORY)
        .action(|args, _, _| {
            let message = args.get("message").unwrap_or("Requested failure");
            Err(Rejection::from(message))
        });
}

/// Unknown input is rejected with close matches when any exist
fn register_unknown_handler(registry: &mut CommandRegistry, weak: Weak<Mutex<CommandRegistry>>) {
    registry.on_unknown_command(move |input, done| {
        let token = input.split_whitespace().next().unwrap_or_default().to_string();
        let Some(shared) = weak.upgrade() else {
            return Err(Rejection::from(format!("Unknown command: {}", token)));
        };
        tokio::spawn(async move {
            let prefix: String = token.chars().take(2).collect();
            let suggestions = shared.lock().await.autocomplete_suggestions(&prefix);
            let message = if suggestions.is_empty() || prefix.is_empty() {
                format!("Unknown command: {}", token)
            } else {
                format!("Unknown command: {} (did you mean: {}?)", token, suggestions.join(", "))
            };
            done.reject(message);
        });
        Ok(())
    });
}
