//! Command engine
//!
//! Declarative command and option model, the input tokenizer and matcher, and
//! the registry that dispatches parsed input to actions while emitting
//! lifecycle events.

// Internal modules - all access should go through api module
pub(crate) mod command;
pub(crate) mod completion;
pub(crate) mod error;
pub(crate) mod events;
pub(crate) mod help;
pub(crate) mod option;
pub(crate) mod parser;
pub(crate) mod registry;

// Public API module - the only public interface for the command engine
pub mod api;

#[cfg(test)]
mod tests;
