//! Command Registry
//!
//! Owns the command table and category index, records history, parses input
//! and dispatches to the matched command's action while emitting lifecycle
//! events.
//!
//! All state mutation happens synchronously inside `&mut self` methods.
//! `execute_command` finishes its synchronous part (history, parse, the
//! `execute` event and the action call) before returning a `'static` future,
//! so several invocations can be outstanding at once and settle in any order.

use crate::command::command::{Command, CommandArgs, CommandTable, OptionValues, DEFAULT_CATEGORY};
use crate::command::completion::{panic_message, Completion, Rejection};
use crate::command::error::CommandError;
use crate::command::events::{CommandEvent, CommandEventType, EventHandler, EventListeners, Subscription};
use crate::command::help::{build_sections, render_html, CategoryIndex, HelpCategory};
use crate::command::parser::{CommandParser, ParseResult};
use crate::history::history::CommandHistory;
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Handler for input that matched no command; settles through the completion
pub type UnknownCommandHandler = Arc<dyn Fn(&str, Completion) -> Result<(), Rejection> + Send + Sync>;

/// Future returned by `execute_command`
pub type ExecutionFuture = BoxFuture<'static, Result<Value, Rejection>>;

/// Per-call execution settings
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Record the raw input in history before parsing
    pub add_to_history: bool,
    /// Merged over the parsed positional values
    pub additional_args: HashMap<String, String>,
    /// Merged over the parsed options
    pub additional_options: OptionValues,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            add_to_history: true,
            additional_args: HashMap::new(),
            additional_options: OptionValues::new(),
        }
    }
}

impl ExecuteOptions {
    /// Execute without touching history
    pub fn without_history() -> Self {
        Self {
            add_to_history: false,
            ..Self::default()
        }
    }
}

pub struct CommandRegistry {
    commands: CommandTable,
    categories: CategoryIndex,
    unknown_handler: Option<UnknownCommandHandler>,
    listeners: Arc<EventListeners>,
    parser: CommandParser,
    history: CommandHistory,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands())
            .field("categories", &self.categories.names())
            .field("has_unknown_handler", &self.unknown_handler.is_some())
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl CommandRegistry {
    /// Registry with an in-memory history of default capacity
    pub fn new() -> Self {
        Self::with_history(CommandHistory::default())
    }

    /// Registry recording into the given history
    pub fn with_history(history: CommandHistory) -> Self {
        Self {
            commands: CommandTable::new(),
            categories: CategoryIndex::default(),
            unknown_handler: None,
            listeners: EventListeners::new(),
            parser: CommandParser::new(),
            history,
        }
    }

    /// Register a command in the `general` category
    pub fn add_command(&mut self, declaration: &str, description: &str) -> &mut Command {
        self.add_command_with_category(declaration, description, DEFAULT_CATEGORY)
    }

    /// Register a command; a later registration with the same name replaces it
    pub fn add_command_with_category(
        &mut self,
        declaration: &str,
        description: &str,
        category: &str,
    ) -> &mut Command {
        let command = Command::new(declaration, description, category);
        let name = command.name().to_string();

        if let Some(previous) = self.commands.remove(&name) {
            log::debug!(
                "Replacing command '{}' (category '{}' -> '{}')",
                name,
                previous.category(),
                category
            );
            self.categories.remove(previous.category(), &name);
        } else {
            log::debug!("Registered command '{}' in category '{}'", name, category);
        }

        self.categories.insert(category, &name);
        self.commands.entry(name).or_insert(command)
    }

    /// Remove a command; false if no command has that name
    pub fn remove_command(&mut self, name: &str) -> bool {
        let Some(command) = self.commands.remove(name) else {
            return false;
        };
        self.categories.remove(command.category(), name);
        log::debug!("Removed command '{}'", name);
        true
    }

    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn get_command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.get_mut(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names, sorted
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Category names in first-use order
    pub fn categories(&self) -> Vec<String> {
        self.categories.names()
    }

    /// Commands of one category in registration order
    pub fn commands_in_category(&self, category: &str) -> Vec<&Command> {
        self.categories
            .members(category)
            .unwrap_or_default()
            .iter()
            .filter_map(|name| self.commands.get(name))
            .collect()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    /// Handler consulted when input matches no command
    pub fn on_unknown_command<F>(&mut self, handler: F)
    where
        F: Fn(&str, Completion) -> Result<(), Rejection> + Send + Sync + 'static,
    {
        self.unknown_handler = Some(Arc::new(handler));
    }

    /// Install an already shared handler
    pub fn set_unknown_command_handler(&mut self, handler: UnknownCommandHandler) {
        self.unknown_handler = Some(handler);
    }

    pub fn clear_unknown_command_handler(&mut self) {
        self.unknown_handler = None;
    }

    /// Subscribe to one event type
    ///
    /// The handler stays registered until `Subscription::unsubscribe` is
    /// called; dropping the handle keeps it.
    pub fn on<F>(&self, event_type: CommandEventType, handler: F) -> Subscription
    where
        F: Fn(&CommandEvent) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        self.listeners.subscribe(event_type, handler)
    }

    pub fn listener_count(&self, event_type: CommandEventType) -> usize {
        self.listeners.count(event_type)
    }

    pub fn parse_command(&self, command_string: &str) -> ParseResult<'_> {
        self.parser.parse(command_string, &self.commands)
    }

    pub fn autocomplete_suggestions(&self, partial: &str) -> Vec<String> {
        self.parser.autocomplete_suggestions(partial, &self.commands)
    }

    /// Help content model, unlisted category excluded
    pub fn help_sections(&self) -> Vec<HelpCategory> {
        build_sections(&self.categories, &self.commands)
    }

    /// Help as an escaped HTML fragment
    pub fn generate_help(&self) -> String {
        render_html(&self.help_sections())
    }

    /// Record, parse and dispatch one input line
    ///
    /// Unmatched input goes to the unknown-command handler and emits only the
    /// `execute` event. For matched input `complete` or `error` is emitted
    /// when the action settles, then the returned future yields the action's
    /// outcome unchanged. Inside a tokio runtime the settlement is watched by
    /// a spawned task, so the events still fire if the future is dropped.
    pub fn execute_command(&mut self, command_string: &str, options: ExecuteOptions) -> ExecutionFuture {
        if options.add_to_history {
            self.history.add(command_string);
        }

        let parsed = self.parser.parse(command_string, &self.commands);
        self.listeners.emit(&CommandEvent::execute(command_string));

        let Some(command) = parsed.command else {
            return self.handle_unknown_command(command_string);
        };

        let mut args: CommandArgs = parsed.args;
        args.merge(options.additional_args, options.additional_options);

        log::debug!("Executing command '{}'", command.name());
        let execution = command.execute(args, command_string);
        let settle = settle_and_emit(execution, Arc::clone(&self.listeners), command_string.to_string());

        // On a runtime the events fire even if the caller drops the future
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let (sender, receiver) = oneshot::channel();
                handle.spawn(async move {
                    let _ = sender.send(settle.await);
                });
                let command = command_string.to_string();
                async move {
                    receiver
                        .await
                        .unwrap_or_else(|_| Err(CommandError::Abandoned { command }.into()))
                }
                .boxed()
            }
            Err(_) => settle.boxed(),
        }
    }

    fn handle_unknown_command(&self, command_string: &str) -> ExecutionFuture {
        let Some(handler) = self.unknown_handler.clone() else {
            let token = command_string
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            log::debug!("Unknown command '{}'", token);
            return future::ready(Err(CommandError::UnknownCommand { token }.into())).boxed();
        };

        let (completion, settled) = Completion::channel();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler(command_string, completion.clone())
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                completion.reject(reason);
            }
            Err(payload) => {
                completion.reject(CommandError::Thrown {
                    message: panic_message(&*payload),
                });
            }
        }
        drop(completion);

        settled.wait(command_string.to_string()).boxed()
    }
}

/// Await the action, then report `complete` or `error`
async fn settle_and_emit(
    execution: ExecutionFuture,
    listeners: Arc<EventListeners>,
    command_string: String,
) -> Result<Value, Rejection> {
    match execution.await {
        Ok(result) => {
            listeners.emit(&CommandEvent::complete(&command_string, result.clone()));
            Ok(result)
        }
        Err(reason) => {
            log::debug!("Command '{}' failed: {}", command_string, reason);
            listeners.emit(&CommandEvent::error(&command_string, reason.normalize()));
            Err(reason)
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
