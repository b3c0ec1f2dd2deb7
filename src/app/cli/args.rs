//! Host command-line arguments
//!
//! Parsed in two passes: a lenient pass that only looks for the colour flags
//! (so `--help` output can be styled accordingly), then the full parse.

use crate::core::styles::palette_to_clap;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "pulse-cli")]
#[command(about = "Interactive command line with history, completion and lifecycle events")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output
    #[arg(short = 'g', long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Log level (or a full logger spec such as 'pulse_cli::command=trace')
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Keep history in memory only for this session
    #[arg(long = "no-history", action = ArgAction::SetTrue)]
    pub no_history: bool,

    /// Directory holding the persisted history
    #[arg(long = "history-dir", value_name = "DIR")]
    pub history_dir: Option<PathBuf>,

    /// Maximum number of history entries
    #[arg(long = "history-size", value_name = "N")]
    pub history_size: Option<usize>,

    /// Print lifecycle events as commands run
    #[arg(short = 't', long = "trace-events", action = ArgAction::SetTrue)]
    pub trace_events: bool,

    /// Run a command line and exit (repeatable; runs in order)
    #[arg(short = 'e', long = "execute", value_name = "COMMAND", action = ArgAction::Append)]
    pub execute: Vec<String>,
}

impl Args {
    pub fn parse_from_env() -> Self {
        Self::parse_from_args(std::env::args_os())
    }

    /// Parse with help styling that follows the colour flags
    pub fn parse_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let colors = Self::colors_requested(&args);
        let matches = Self::command()
            .styles(Self::get_help_styles(colors))
            .get_matches_from(args);
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Colour for the help screen: `--color` wins, `--no-color` disables
    fn colors_requested(args: &[OsString]) -> bool {
        let has = |flag: &str| args.iter().any(|arg| arg == flag);
        (has("--color") || has("-g")) && !has("--no-color")
    }

    fn get_help_styles(colors_enabled: bool) -> clap::builder::Styles {
        palette_to_clap(colors_enabled)
    }

    /// Interactive mode unless commands were given with `--execute`
    pub fn is_interactive(&self) -> bool {
        self.execute.is_empty()
    }
}
