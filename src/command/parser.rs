//! Input tokenizer and command matcher
//!
//! Turns one raw input line into the matched command, its positional values
//! and its options. The parser holds no state; the command table is passed
//! in on every call.
//!
//! Parsing stages:
//! 1. quoted spans are swapped for `__QUOTED_<n>__` placeholders so their
//!    spaces survive whitespace splitting
//! 2. the line is split before the first flag-looking token (one or two
//!    dashes then a letter) into a command portion and an options portion
//! 3. the command portion is matched, longest registered name first, falling
//!    back to an unambiguous abbreviation of the first word
//! 4. positional values bind to the command's slots in order
//! 5. the options portion runs through a two-state flag/value machine

use crate::command::command::{strip_brackets, Command, CommandArgs, CommandTable, OptionValue, OptionValues};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static QUOTED_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'"#).unwrap());
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"__QUOTED_\d+__").unwrap());
static OPTIONS_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s--?[A-Za-z]").unwrap());

/// Result of parsing one input line
#[derive(Debug, Clone)]
pub struct ParseResult<'a> {
    /// Matched command, if any
    pub command: Option<&'a Command>,
    /// Positional values and options; empty when nothing matched
    pub args: CommandArgs,
    /// The trimmed input
    pub command_string: String,
}

impl<'a> ParseResult<'a> {
    fn unmatched(command_string: &str) -> Self {
        Self {
            command: None,
            args: CommandArgs::new(),
            command_string: command_string.to_string(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.command.is_some()
    }

    pub fn options(&self) -> &OptionValues {
        self.args.options()
    }
}

/// Quoted spans lifted out of an input line
#[derive(Debug, Default)]
struct QuotedStrings {
    originals: HashMap<String, String>,
}

impl QuotedStrings {
    /// Replace every quoted span with a placeholder, remembering its inner text
    fn extract(input: &str) -> (String, Self) {
        let mut quoted = Self::default();
        let replaced = QUOTED_SPAN.replace_all(input, |caps: &Captures| {
            let inner = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            let placeholder = format!("__QUOTED_{}__", quoted.originals.len());
            quoted
                .originals
                .insert(placeholder.clone(), inner.to_string());
            placeholder
        });
        (replaced.into_owned(), quoted)
    }

    /// Put original text back in place of any placeholder in `token`
    fn restore(&self, token: &str) -> String {
        if self.originals.is_empty() {
            return token.to_string();
        }
        PLACEHOLDER
            .replace_all(token, |caps: &Captures| {
                let placeholder = &caps[0];
                self.originals
                    .get(placeholder)
                    .cloned()
                    .unwrap_or_else(|| placeholder.to_string())
            })
            .into_owned()
    }
}

/// Flag/value association state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagState<'t> {
    AwaitingFlag,
    AwaitingValue(&'t str),
}

/// Stateless tokenizer and matcher
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `command_string` against the registered commands
    pub fn parse<'a>(&self, command_string: &str, commands: &'a CommandTable) -> ParseResult<'a> {
        let trimmed = command_string.trim();
        if trimmed.is_empty() {
            return ParseResult::unmatched(trimmed);
        }

        let (processed, quoted) = QuotedStrings::extract(trimmed);
        let (command_portion, options_portion) = split_options(&processed);

        let Some((command, positional_values)) = match_command(command_portion, commands) else {
            log::trace!("No command matched input '{}'", trimmed);
            return ParseResult::unmatched(trimmed);
        };

        let mut args = CommandArgs::new();
        for (slot, value) in command.positional_args().iter().zip(&positional_values) {
            args.insert(strip_brackets(slot), quoted.restore(value));
        }

        let options = parse_options(command, options_portion, &quoted);
        args.set_options(options);

        log::trace!(
            "Parsed '{}' as command '{}' with {} positional value(s)",
            trimmed,
            command.name(),
            positional_values.len()
        );

        ParseResult {
            command: Some(command),
            args,
            command_string: trimmed.to_string(),
        }
    }

    /// Registered names starting with `partial`, case-insensitively, sorted
    pub fn autocomplete_suggestions(&self, partial: &str, commands: &CommandTable) -> Vec<String> {
        let needle = partial.to_lowercase();
        let mut suggestions: Vec<String> = commands
            .keys()
            .filter(|name| name.to_lowercase().starts_with(&needle))
            .cloned()
            .collect();
        suggestions.sort();
        suggestions
    }
}

/// Split at the first whitespace followed by `-` or `--` and a letter
fn split_options(processed: &str) -> (&str, &str) {
    match OPTIONS_BOUNDARY.find(processed) {
        Some(boundary) => (
            processed[..boundary.start()].trim(),
            processed[boundary.start()..].trim(),
        ),
        None => (processed, ""),
    }
}

/// Two-phase lookup: full or space-terminated prefix match over names sorted
/// longest first, then an unambiguous abbreviation of the first word
pub(crate) fn match_command<'a>(
    command_portion: &str,
    commands: &'a CommandTable,
) -> Option<(&'a Command, Vec<String>)> {
    match_full_name(command_portion, commands)
        .or_else(|| match_abbreviation(command_portion, commands))
}

fn match_full_name<'a>(
    command_portion: &str,
    commands: &'a CommandTable,
) -> Option<(&'a Command, Vec<String>)> {
    let mut names: Vec<&String> = commands.keys().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    names.into_iter().find_map(|name| {
        let matched = command_portion == name.as_str()
            || command_portion
                .strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with(' '));
        if !matched {
            return None;
        }
        let remainder = command_portion[name.len()..]
            .split_whitespace()
            .map(str::to_string)
            .collect();
        commands.get(name).map(|command| (command, remainder))
    })
}

fn match_abbreviation<'a>(
    command_portion: &str,
    commands: &'a CommandTable,
) -> Option<(&'a Command, Vec<String>)> {
    let mut words = command_portion.split_whitespace();
    let first = words.next()?;

    let mut candidates = commands
        .iter()
        .filter(|(name, _)| name.starts_with(first));
    let (_, command) = candidates.next()?;
    if candidates.next().is_some() {
        log::trace!("Abbreviation '{}' is ambiguous", first);
        return None;
    }

    Some((command, words.map(str::to_string).collect()))
}

/// Collect raw flag values, then map them onto the command's declared options
fn parse_options(command: &Command, options_portion: &str, quoted: &QuotedStrings) -> OptionValues {
    let collected = collect_flag_values(options_portion, quoted);

    let mut options = OptionValues::new();
    for option in command.options() {
        let mut present = false;
        let mut values = Vec::new();
        for flag in [option.short(), option.long()].into_iter().flatten() {
            if let Some(flag_values) = collected.get(flag) {
                present = true;
                values.extend(flag_values.iter().cloned());
            }
        }
        if present {
            options.insert(option.name(), OptionValue::from_values(values));
        }
    }
    options
}

/// Each flag occurrence claims at most the one non-flag token right after it;
/// any further bare tokens are dropped until the next flag.
fn collect_flag_values(options_portion: &str, quoted: &QuotedStrings) -> HashMap<String, Vec<String>> {
    let mut collected: HashMap<String, Vec<String>> = HashMap::new();
    let mut state = FlagState::AwaitingFlag;

    for token in options_portion.split_whitespace() {
        if token.starts_with('-') {
            collected.entry(token.to_string()).or_default();
            state = FlagState::AwaitingValue(token);
            continue;
        }

        match state {
            FlagState::AwaitingValue(flag) => {
                collected
                    .entry(flag.to_string())
                    .or_default()
                    .push(quoted.restore(token));
                state = FlagState::AwaitingFlag;
            }
            FlagState::AwaitingFlag => {
                log::trace!("Dropping unattached token '{}'", token);
            }
        }
    }

    collected
}
