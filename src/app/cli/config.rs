//! TOML configuration file loading
//!
//! ```toml
//! color = true
//! trace_events = false
//!
//! [history]
//! max_size = 500
//! persist = true
//! storage_key = "pulse-cli-history"
//! directory = "/home/me/.local/share/PulseCli"
//!
//! [logging]
//! level = "debug"
//! format = "ext"
//! file = "none"
//! ```
//!
//! Command-line flags override file values; file values override defaults.

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::history::api::{FileStorage, HistoryOptions, DEFAULT_MAX_SIZE, DEFAULT_STORAGE_KEY};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "PulseCli";
const CONFIG_FILE_NAME: &str = "pulse-cli.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<String> {
        self.is_user_actionable().then(|| self.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistorySection {
    pub max_size: Option<usize>,
    pub persist: Option<bool>,
    pub storage_key: Option<String>,
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub color: Option<bool>,
    pub trace_events: bool,
    pub history: HistorySection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// `<config dir>/PulseCli/pulse-cli.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the given file, or the default file when present
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the default configuration.
    pub async fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("No configuration file found; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// History settings after applying command-line overrides
    ///
    /// Persistence is on unless the file or `--no-history` turns it off.
    pub fn history_options(&self, args: &Args) -> HistoryOptions {
        HistoryOptions {
            max_size: args
                .history_size
                .or(self.history.max_size)
                .unwrap_or(DEFAULT_MAX_SIZE),
            persist: !args.no_history && self.history.persist.unwrap_or(true),
            storage_key: self
                .history
                .storage_key
                .clone()
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
        }
    }

    pub fn history_directory(&self, args: &Args) -> PathBuf {
        args.history_dir
            .clone()
            .or_else(|| self.history.directory.clone())
            .unwrap_or_else(FileStorage::default_directory)
    }

    /// Colour decision: flags, then a non-empty `NO_COLOR`, then the file,
    /// then TTY detection
    pub fn use_color(&self, args: &Args, is_terminal: bool) -> bool {
        if args.no_color {
            return false;
        }
        if args.color {
            return true;
        }
        if std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()) {
            return false;
        }
        self.color.unwrap_or(is_terminal)
    }

    pub fn log_level(&self, args: &Args) -> Option<String> {
        args.log_level.clone().or_else(|| self.logging.level.clone())
    }

    pub fn log_format(&self, args: &Args) -> Option<String> {
        args.log_format.clone().or_else(|| self.logging.format.clone())
    }

    pub fn log_file(&self, args: &Args) -> Option<PathBuf> {
        args.log_file.clone().or_else(|| self.logging.file.clone())
    }

    pub fn trace_events(&self, args: &Args) -> bool {
        args.trace_events || self.trace_events
    }
}
