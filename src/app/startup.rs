//! Host startup: arguments, configuration, logging, history and the loop

use crate::app::builtin::{register_builtins, Session, SharedRegistry};
use crate::app::cli::args::Args;
use crate::app::cli::config::AppConfig;
use crate::app::display;
use crate::app::repl::Repl;
use crate::command::api::{CommandEventType, CommandRegistry};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::version::banner;
use crate::history::api::{CommandHistory, FileStorage, HistoryOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::Mutex;

/// Run the host; returns the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse_from_env();

    // Logging settings may come from the file, so a bad file is reported
    // once logging is up
    let (config, config_error) = match AppConfig::load(args.config_file.as_deref()).await {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    let color = config.use_color(&args, std::io::stdout().is_terminal());
    let log_file = config.log_file(&args).map(|path| path.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        config.log_level(&args).as_deref(),
        config.log_format(&args).as_deref(),
        log_file.as_deref(),
        color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    if let Some(e) = config_error {
        log_error_with_context(&e, "Loading configuration");
        return 1;
    }

    log::info!("{} starting", banner());

    let options = config.history_options(&args);
    let history = build_history(options, config.history_directory(&args)).await;
    let shared: SharedRegistry = Arc::new(Mutex::new(CommandRegistry::with_history(history)));
    let session = Session::new();

    {
        let mut registry = shared.lock().await;
        register_builtins(&mut registry, &shared, &session, color);
        if config.trace_events(&args) {
            trace_events(&registry, color);
        }
        log::debug!("Registered {} commands", registry.command_count());
    }

    let repl = Repl::new(Arc::clone(&shared), session, color);
    let code = if args.is_interactive() {
        println!("{}", banner());
        println!("Type 'help' for a list of commands, 'exit' to leave.");
        match repl.run_interactive().await {
            Ok(()) => 0,
            Err(e) => {
                log::error!("Input error: {}", e);
                1
            }
        }
    } else if repl.run_batch(&args.execute).await {
        0
    } else {
        1
    };

    shared.lock().await.history().flush().await;
    log::info!("Session finished");
    code
}

/// History backed by a file store when persistence is on
pub async fn build_history(options: HistoryOptions, directory: PathBuf) -> CommandHistory {
    if !options.persist {
        return CommandHistory::new(options);
    }
    log::debug!("Persisting history under {}", directory.display());
    CommandHistory::with_storage(options, Arc::new(FileStorage::new(directory))).await
}

/// Print every lifecycle event to stderr
fn trace_events(registry: &CommandRegistry, color: bool) {
    for event_type in CommandEventType::iter() {
        registry.on(event_type, move |event| {
            eprintln!("{}", display::render_event(event, color));
        });
    }
}
