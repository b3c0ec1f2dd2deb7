//! Tests for configuration loading and precedence

use crate::app::cli::args::Args;
use crate::app::cli::config::*;
use crate::history::api::{DEFAULT_MAX_SIZE, DEFAULT_STORAGE_KEY};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"
color = false
trace_events = true

[history]
max_size = 10
storage_key = "work"
directory = "/var/lib/pulse"

[logging]
level = "warn"
format = "ext"
"#;

#[test]
fn test_parse_full_file() {
    let config = AppConfig::from_toml(SAMPLE).unwrap();

    assert_eq!(config.color, Some(false));
    assert!(config.trace_events);
    assert_eq!(config.history.max_size, Some(10));
    assert_eq!(config.history.storage_key.as_deref(), Some("work"));
    assert_eq!(config.logging.level.as_deref(), Some("warn"));
    assert_eq!(config.logging.file, None);
}

#[test]
fn test_unknown_keys_are_rejected() {
    assert!(AppConfig::from_toml("[history]\nsize = 3\n").is_err());
}

#[test]
fn test_history_options_defaults() {
    let options = AppConfig::default().history_options(&Args::default());

    assert_eq!(options.max_size, DEFAULT_MAX_SIZE);
    assert_eq!(options.storage_key, DEFAULT_STORAGE_KEY);
    assert!(options.persist);
}

#[test]
fn test_flags_override_file_values() {
    let config = AppConfig::from_toml(SAMPLE).unwrap();
    let args = Args {
        history_size: Some(3),
        history_dir: Some(PathBuf::from("/tmp/override")),
        log_level: Some("trace".to_string()),
        no_history: true,
        ..Args::default()
    };

    let options = config.history_options(&args);
    assert_eq!(options.max_size, 3);
    assert_eq!(options.storage_key, "work");
    assert!(!options.persist);

    assert_eq!(config.history_directory(&args), PathBuf::from("/tmp/override"));
    assert_eq!(config.log_level(&args).as_deref(), Some("trace"));
    assert_eq!(config.log_format(&args).as_deref(), Some("ext"));
}

#[test]
#[serial]
fn test_color_precedence() {
    let orig_no_color = env::var_os("NO_COLOR");
    env::remove_var("NO_COLOR");
    let config = AppConfig::from_toml("color = true").unwrap();

    assert!(config.use_color(&Args::default(), false));
    let no_color = Args {
        no_color: true,
        ..Args::default()
    };
    assert!(!config.use_color(&no_color, true));
    assert!(AppConfig::default().use_color(&Args::default(), true));
    assert!(!AppConfig::default().use_color(&Args::default(), false));

    if let Some(value) = orig_no_color {
        env::set_var("NO_COLOR", value);
    }
}

#[test]
#[serial]
fn test_no_color_env_yields_to_color_flag() {
    let orig_no_color = env::var_os("NO_COLOR");
    env::set_var("NO_COLOR", "1");

    let config = AppConfig::from_toml("color = true").unwrap();
    assert!(!config.use_color(&Args::default(), true));
    let forced = Args {
        color: true,
        ..Args::default()
    };
    assert!(config.use_color(&forced, false));

    match orig_no_color {
        Some(value) => env::set_var("NO_COLOR", value),
        None => env::remove_var("NO_COLOR"),
    }
}

#[tokio::test]
async fn test_load_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    let config = AppConfig::load(Some(file.path())).await.unwrap();
    assert_eq!(config.history.max_size, Some(10));
}

#[tokio::test]
async fn test_missing_explicit_file_is_an_error() {
    let missing = PathBuf::from("/definitely/not/here/pulse-cli.toml");
    let error = AppConfig::load(Some(&missing)).await.unwrap_err();

    assert!(matches!(error, ConfigError::NotFound { .. }));
}

#[tokio::test]
async fn test_malformed_file_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[history\nmax_size = ").unwrap();

    let error = AppConfig::load(Some(file.path())).await.unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
}
