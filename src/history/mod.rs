//! Command history
//!
//! Bounded, navigable list of past command lines with optional persistence
//! through an injected storage adapter.

// Internal modules - all access should go through api module
pub(crate) mod error;
pub(crate) mod history;
pub(crate) mod storage;

// Public API module - the only public interface for the history system
pub mod api;

#[cfg(test)]
mod tests;
