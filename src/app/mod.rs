//! Application module

pub mod builtin;
pub mod cli;
pub mod display;
pub mod repl;
pub mod startup;
