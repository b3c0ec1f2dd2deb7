//! Command declarations and execution
//!
//! A command is declared with a string such as `"list users <role> [limit]"`:
//! everything before the first `<` or `[` is the (possibly multi-word) name,
//! the bracketed placeholders are positional argument slots.

use crate::command::completion::{panic_message, Completion, Rejection, Settled};
use crate::command::error::{CommandError, CommandResult};
use crate::command::option::CommandOption;
use futures::future::{self, BoxFuture, Either, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

static POSITIONAL_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<\[]\w+[>\]]").unwrap());

/// Category used when none is given
pub const DEFAULT_CATEGORY: &str = "general";

/// Category excluded from generated help
pub const UNLISTED_CATEGORY: &str = "unlisted";

/// Future an action may hand back for asynchronous failure reporting
pub type ActionFuture = BoxFuture<'static, Result<Value, Rejection>>;

/// Synchronous return of an action: `Err` is an immediate failure,
/// `Ok(Some(_))` a future whose failure (only) fails the command.
pub type ActionResult = Result<Option<ActionFuture>, Rejection>;

/// Action invoked with the bound arguments, the raw input and the completion handle
pub type ActionCallback = Arc<dyn Fn(CommandArgs, &str, Completion) -> ActionResult + Send + Sync>;

/// Registered commands keyed by name
pub type CommandTable = HashMap<String, Command>;

/// Parsed value of one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Flag present without a value
    Flag,
    Single(String),
    /// Several values collected across short and long forms
    Multiple(Vec<String>),
}

impl OptionValue {
    pub(crate) fn from_values(mut values: Vec<String>) -> Self {
        match values.len() {
            0 => OptionValue::Flag,
            1 => OptionValue::Single(values.remove(0)),
            _ => OptionValue::Multiple(values),
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, OptionValue::Flag)
    }

    /// The single value, or the first of several
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Flag => None,
            OptionValue::Single(value) => Some(value),
            OptionValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            OptionValue::Flag => Vec::new(),
            OptionValue::Single(value) => vec![value.as_str()],
            OptionValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&OptionValue> for Value {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Flag => Value::Bool(true),
            OptionValue::Single(value) => Value::String(value.clone()),
            OptionValue::Multiple(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Parsed options keyed by canonical option name
pub type OptionValues = HashMap<String, OptionValue>;

/// Arguments handed to an action
///
/// Positional values by slot name plus the parsed options, which occupy the
/// reserved `options` entry when rendered as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    values: HashMap<String, String>,
    options: OptionValues,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.options.is_empty()
    }

    pub(crate) fn set_options(&mut self, options: OptionValues) {
        self.options = options;
    }

    /// Shallow merge: later keys replace parsed ones
    pub(crate) fn merge(
        &mut self,
        additional_args: HashMap<String, String>,
        additional_options: OptionValues,
    ) {
        self.values.extend(additional_args);
        self.options.extend(additional_options);
    }

    /// JSON object with the positional values and the `options` entry
    pub fn to_json(&self) -> Value {
        let mut object: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        let options: serde_json::Map<String, Value> = self
            .options
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect();
        object.insert("options".to_string(), Value::Object(options));
        Value::Object(object)
    }
}

/// One registered command
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    category: String,
    positional_args: Vec<String>,
    options: Vec<CommandOption>,
    callback: Option<ActionCallback>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("positional_args", &self.positional_args)
            .field("options", &self.options)
            .field("has_action", &self.callback.is_some())
            .finish()
    }
}

impl Command {
    /// Parse a declaration such as `"greet <name> [greeting]"`
    pub fn new(declaration: &str, description: &str, category: &str) -> Self {
        let split_at = declaration.find(['<', '[']).unwrap_or(declaration.len());
        let name = declaration[..split_at].trim().to_string();
        let positional_args = POSITIONAL_PLACEHOLDER
            .find_iter(&declaration[split_at..])
            .map(|m| m.as_str().to_string())
            .collect();

        Self {
            name,
            description: description.to_string(),
            category: category.to_string(),
            positional_args,
            options: Vec::new(),
            callback: None,
        }
    }

    /// Attach an option, skipping declarations without a flag token
    pub fn option(&mut self, flags: &str, description: &str) -> &mut Self {
        match CommandOption::new(flags, description) {
            Ok(option) => self.options.push(option),
            Err(error) => log::warn!("Command '{}': {}", self.name, error),
        }
        self
    }

    /// Attach an option, reporting malformed declarations
    pub fn try_option(&mut self, flags: &str, description: &str) -> CommandResult<&mut Self> {
        let option = CommandOption::new(flags, description)?;
        self.options.push(option);
        Ok(self)
    }

    /// Set the action run by `execute`
    pub fn action<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(CommandArgs, &str, Completion) -> ActionResult + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Placeholders in declaration order, brackets included
    pub fn positional_args(&self) -> &[String] {
        &self.positional_args
    }

    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    pub fn has_action(&self) -> bool {
        self.callback.is_some()
    }

    /// Name followed by the positional placeholders
    pub fn signature(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.positional_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Example invocation: name, slot names, then long flags with their value names
    pub fn usage_example(&self) -> String {
        let mut parts = vec![self.name.clone()];
        parts.extend(self.positional_args.iter().map(|arg| strip_brackets(arg)));
        for option in &self.options {
            if let Some(long) = option.long() {
                parts.push(long.to_string());
                if let Some(value_name) = option.value_name() {
                    parts.push(value_name.to_string());
                }
            }
        }
        parts.join(" ")
    }

    /// Run the action
    ///
    /// The action is invoked before this returns. A synchronous `Err` or a
    /// panic rejects the invocation. When the action returns a future, only
    /// that future's failure is chained into the result; its success value is
    /// discarded, so an action must call `resolve` to produce a result.
    pub fn execute(&self, args: CommandArgs, command_string: &str) -> ActionFuture {
        let Some(callback) = self.callback.clone() else {
            let error = CommandError::NoAction {
                name: self.name.clone(),
            };
            return future::ready(Err(error.into())).boxed();
        };

        let (completion, settled) = Completion::channel();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            callback(args, command_string, completion.clone())
        }));

        let mut inline_driver = None;
        match outcome {
            Ok(Ok(None)) => {}
            Ok(Ok(Some(returned))) => {
                let driver = chain_rejection(returned, completion.clone());
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(driver);
                    }
                    Err(_) => inline_driver = Some(driver),
                }
            }
            Ok(Err(reason)) => {
                completion.reject(reason);
            }
            Err(payload) => {
                completion.reject(CommandError::ActionPanicked {
                    name: self.name.clone(),
                    message: panic_message(&*payload),
                });
            }
        }
        drop(completion);

        let command = command_string.to_string();
        match inline_driver {
            None => settled.wait(command).boxed(),
            Some(driver) => wait_alongside(settled, command, driver).boxed(),
        }
    }
}

fn chain_rejection(returned: ActionFuture, completion: Completion) -> BoxFuture<'static, ()> {
    async move {
        if let Err(reason) = returned.await {
            completion.reject(reason);
        }
    }
    .boxed()
}

// Without a runtime to spawn on, the returned future is polled together with
// the settlement and dropped once the command settles.
async fn wait_alongside(
    settled: Settled,
    command: String,
    driver: BoxFuture<'static, ()>,
) -> Result<Value, Rejection> {
    let wait = settled.wait(command).boxed();
    match future::select(wait, driver).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), wait)) => wait.await,
    }
}

/// `<name>` / `[name]` -> `name`
pub(crate) fn strip_brackets(placeholder: &str) -> String {
    placeholder
        .trim_start_matches(['<', '['])
        .trim_end_matches(['>', ']'])
        .to_string()
}
