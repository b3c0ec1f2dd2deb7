//! Public API for the command engine
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Declarations
pub use crate::command::command::{
    ActionCallback, ActionFuture, ActionResult, Command, CommandArgs, CommandTable, OptionValue,
    OptionValues, DEFAULT_CATEGORY, UNLISTED_CATEGORY,
};
pub use crate::command::option::{CommandOption, OptionArity};

// Execution protocol
pub use crate::command::completion::{stringify_value, Completion, Rejection, Settlement};

// Error handling
pub use crate::command::error::{CommandError, CommandResult};

// Parsing
pub use crate::command::parser::{CommandParser, ParseResult};

// Registry, events and help
pub use crate::command::events::{CommandEvent, CommandEventType, EventHandler, Subscription};
pub use crate::command::help::{escape_html, render_html, HelpCategory, HelpCommand, HelpOption};
pub use crate::command::registry::{
    CommandRegistry, ExecuteOptions, ExecutionFuture, UnknownCommandHandler,
};
