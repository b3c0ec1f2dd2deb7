//! Tests for the CLI module
//!
//! Argument parsing, configuration file loading and the precedence between
//! flags, file values and defaults.

pub mod config_tests;
