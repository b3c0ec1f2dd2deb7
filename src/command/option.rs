//! Option declarations
//!
//! An option is declared with a flags string such as `"-o, --output <file>"`.
//! `<...>` marks a required value, `[...]` an optional value, and a flags
//! string with neither declares a boolean switch.

use crate::command::error::{CommandError, CommandResult};
use once_cell::sync::Lazy;
use regex::Regex;

static FLAG_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,|\s]+").unwrap());
static VALUE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<\[]\w+[>\]]").unwrap());

/// Value cardinality of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionArity {
    /// `<value>` in the declaration
    Required,
    /// `[value]` in the declaration
    Optional,
    /// No value placeholder
    Boolean,
}

/// One flag definition attached to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    flags: String,
    short: Option<String>,
    long: Option<String>,
    arity: OptionArity,
    description: String,
}

impl CommandOption {
    /// Build an option from its flags declaration
    ///
    /// Fails when the declaration holds no usable dash-prefixed token, since
    /// such an option would have an empty canonical name.
    pub fn new(flags: &str, description: &str) -> CommandResult<Self> {
        let arity = if flags.contains('<') {
            OptionArity::Required
        } else if flags.contains('[') {
            OptionArity::Optional
        } else {
            OptionArity::Boolean
        };

        let mut short = None;
        let mut long = None;
        for token in FLAG_SEPARATOR.split(flags) {
            if token.starts_with("--") {
                let end = token.find([' ', '<', '>', '[', ']']).unwrap_or(token.len());
                long = Some(token[..end].to_string());
            } else if token.starts_with('-') {
                short = Some(token.to_string());
            }
        }

        let option = Self {
            flags: flags.to_string(),
            short,
            long,
            arity,
            description: description.to_string(),
        };

        if option.name().is_empty() {
            return Err(CommandError::InvalidOption {
                flags: flags.to_string(),
            });
        }

        Ok(option)
    }

    /// Canonical key used in parsed option maps
    ///
    /// `--output` -> `output`, `--no-color` -> `color`, `-v` -> `v`.
    pub fn name(&self) -> String {
        if let Some(long) = &self.long {
            let stripped = long.trim_start_matches("--");
            return stripped.strip_prefix("no-").unwrap_or(stripped).to_string();
        }
        if let Some(short) = &self.short {
            return short.trim_start_matches('-').to_string();
        }
        String::new()
    }

    /// Exact comparison against the short or long flag token
    pub fn matches(&self, token: &str) -> bool {
        self.short.as_deref() == Some(token) || self.long.as_deref() == Some(token)
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arity(&self) -> OptionArity {
        self.arity
    }

    pub fn is_required(&self) -> bool {
        self.arity == OptionArity::Required
    }

    pub fn is_optional(&self) -> bool {
        self.arity == OptionArity::Optional
    }

    pub fn is_boolean(&self) -> bool {
        self.arity == OptionArity::Boolean
    }

    pub fn takes_value(&self) -> bool {
        !self.is_boolean()
    }

    /// A `--no-x` declaration
    pub fn is_negated(&self) -> bool {
        self.long
            .as_deref()
            .is_some_and(|long| long.starts_with("--no-"))
    }

    /// The bracketed value token of the declaration, e.g. `<file>`
    pub fn value_name(&self) -> Option<&str> {
        VALUE_PLACEHOLDER.find(&self.flags).map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_value_option() {
        let option = CommandOption::new("-o, --output <file>", "Output file").unwrap();

        assert_eq!(option.short(), Some("-o"));
        assert_eq!(option.long(), Some("--output"));
        assert!(option.is_required());
        assert!(!option.is_optional());
        assert!(!option.is_boolean());
        assert_eq!(option.name(), "output");
        assert_eq!(option.value_name(), Some("<file>"));
    }

    #[test]
    fn test_optional_and_boolean_classification() {
        let optional = CommandOption::new("-c, --count [n]", "Count").unwrap();
        assert_eq!(optional.arity(), OptionArity::Optional);
        assert!(optional.takes_value());

        let boolean = CommandOption::new("-l, --loud", "Shout").unwrap();
        assert_eq!(boolean.arity(), OptionArity::Boolean);
        assert!(!boolean.takes_value());
        assert_eq!(boolean.value_name(), None);
    }

    #[test]
    fn test_pipe_separator_and_attached_placeholder() {
        let option = CommandOption::new("-t|--times<n>", "Repeat").unwrap();
        assert_eq!(option.short(), Some("-t"));
        assert_eq!(option.long(), Some("--times"));
        assert!(option.is_required());
    }

    #[test]
    fn test_negated_long_flag_name() {
        let option = CommandOption::new("--no-color", "Disable colour").unwrap();
        assert_eq!(option.name(), "color");
        assert!(option.is_negated());
        assert!(option.matches("--no-color"));
        assert!(!option.matches("--color"));
    }

    #[test]
    fn test_short_only_name() {
        let option = CommandOption::new("-v", "Verbose").unwrap();
        assert_eq!(option.long(), None);
        assert_eq!(option.name(), "v");
        assert!(option.matches("-v"));
    }

    #[test]
    fn test_declaration_without_flag_is_rejected() {
        let error = CommandOption::new("output <file>", "Broken").unwrap_err();
        assert_eq!(
            error,
            CommandError::InvalidOption {
                flags: "output <file>".to_string()
            }
        );

        assert!(CommandOption::new("--", "Only dashes").is_err());
    }
}
