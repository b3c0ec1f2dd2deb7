//! Line-oriented host loop
//!
//! Each line is dispatched with the registry lock held only for the
//! synchronous part of `execute_command`; the returned future is awaited
//! after the lock is released so registry-aware commands can take it.

use crate::app::builtin::{Session, SharedRegistry};
use crate::app::display;
use crate::command::api::{ExecuteOptions, Rejection};
use crate::core::styles::StyleRole;
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const PROMPT: &str = "pulse> ";

pub struct Repl {
    registry: SharedRegistry,
    session: Session,
    color: bool,
}

impl Repl {
    pub fn new(registry: SharedRegistry, session: Session, color: bool) -> Self {
        Self {
            registry,
            session,
            color,
        }
    }

    /// Dispatch one line and wait for its outcome
    pub async fn run_line(&self, line: &str) -> Result<Value, Rejection> {
        let pending = {
            let mut registry = self.registry.lock().await;
            registry.execute_command(line, ExecuteOptions::default())
        };
        pending.await
    }

    /// Text to print for an outcome and whether it counts as success
    pub fn render_outcome(&self, outcome: &Result<Value, Rejection>) -> (Option<String>, bool) {
        match outcome {
            Ok(value) => (display::render_result(value), true),
            Err(rejection) => (Some(display::render_rejection(rejection, self.color)), false),
        }
    }

    /// Run the given lines in order; true when all of them succeeded
    ///
    /// Stops early when a command requests exit.
    pub async fn run_batch(&self, lines: &[String]) -> bool {
        let mut all_succeeded = true;
        for line in lines {
            let outcome = self.run_line(line).await;
            let (text, succeeded) = self.render_outcome(&outcome);
            self.print(text, succeeded);
            all_succeeded &= succeeded;
            if self.session.exit_requested() {
                break;
            }
        }
        all_succeeded
    }

    /// Read lines from stdin until end of input or `exit`
    pub async fn run_interactive(&self) -> io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout
                .write_all(StyleRole::Prompt.paint(PROMPT, self.color).as_bytes())
                .await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                log::debug!("End of input");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let outcome = self.run_line(&line).await;
            let (text, succeeded) = self.render_outcome(&outcome);
            self.print(text, succeeded);

            if self.session.exit_requested() {
                break;
            }
        }
        Ok(())
    }

    fn print(&self, text: Option<String>, succeeded: bool) {
        match (text, succeeded) {
            (Some(text), true) => println!("{}", text),
            (Some(text), false) => eprintln!("{}", text),
            (None, _) => {}
        }
    }
}
