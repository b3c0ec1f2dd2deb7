//! Test modules for the command system
//!
//! Parser matching rules, registry bookkeeping and the execution lifecycle
//! with its events.

mod events;
mod utils;
