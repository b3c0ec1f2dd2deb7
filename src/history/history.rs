//! Bounded, navigable command history
//!
//! Entries are trimmed, non-empty input lines. The navigation index runs from
//! 0 to `len()`, where `len()` is the live line past the newest entry.
//! Consecutive duplicates are never stored and the oldest entry is evicted
//! once the capacity is exceeded.
//!
//! With persistence enabled the buffer is loaded once when the history is
//! built, and every mutation queues a JSON save to a single writer task, so
//! saves reach storage in mutation order.

use crate::history::error::{HistoryError, HistoryResult};
use crate::history::storage::StorageAdapter;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

pub const DEFAULT_MAX_SIZE: usize = 100;
pub const DEFAULT_STORAGE_KEY: &str = "pulse-cli-history";

/// History settings, usable directly as a `[history]` config table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    pub max_size: usize,
    pub persist: bool,
    pub storage_key: String,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            persist: false,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

enum PersistRequest {
    Save(String),
    Flush(oneshot::Sender<()>),
}

pub struct CommandHistory {
    entries: VecDeque<String>,
    index: usize,
    max_size: usize,
    storage_key: String,
    writer: Option<UnboundedSender<PersistRequest>>,
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHistory")
            .field("entries", &self.entries)
            .field("index", &self.index)
            .field("max_size", &self.max_size)
            .field("persistent", &self.writer.is_some())
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(HistoryOptions::default())
    }
}

impl CommandHistory {
    /// In-memory history; `persist` is ignored without a storage adapter
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            entries: VecDeque::new(),
            index: 0,
            max_size: options.max_size,
            storage_key: options.storage_key,
            writer: None,
        }
    }

    /// History backed by `storage` when `options.persist` is set
    ///
    /// Loads the stored buffer (keeping the newest `max_size` entries) and
    /// starts the writer task. Must be called within a tokio runtime.
    /// Load failures are logged and leave the history empty.
    pub async fn with_storage(options: HistoryOptions, storage: Arc<dyn StorageAdapter>) -> Self {
        let mut history = Self::new(options.clone());
        if !options.persist {
            return history;
        }

        match load_entries(storage.as_ref(), &options.storage_key).await {
            Ok(mut loaded) => {
                if loaded.len() > history.max_size {
                    loaded.drain(..loaded.len() - history.max_size);
                }
                log::debug!(
                    "Loaded {} history entries from '{}'",
                    loaded.len(),
                    options.storage_key
                );
                history.entries = loaded.into();
                history.index = history.entries.len();
            }
            Err(e) => {
                log::warn!("Failed to load command history: {}", e);
            }
        }

        let (sender, receiver) = unbounded_channel();
        tokio::spawn(run_writer(storage, options.storage_key, receiver));
        history.writer = Some(sender);
        history
    }

    /// Append a command line
    ///
    /// Blank input is ignored. Repeating the newest entry only resets the
    /// navigation index.
    pub fn add(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }

        if self.entries.back().map(String::as_str) == Some(command) {
            self.index = self.entries.len();
            return;
        }

        self.entries.push_back(command.to_string());
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
        self.index = self.entries.len();
        self.save();
    }

    /// Step back; stays on the oldest entry once reached
    pub fn get_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.index > 0 {
            self.index -= 1;
        }
        self.entries.get(self.index).map(String::as_str)
    }

    /// Step forward; `None` once past the newest entry (the live line)
    pub fn get_next(&mut self) -> Option<&str> {
        if self.index + 1 < self.entries.len() {
            self.index += 1;
            return self.entries.get(self.index).map(String::as_str);
        }
        self.index = self.entries.len();
        None
    }

    pub fn reset_index(&mut self) {
        self.index = self.entries.len();
    }

    /// Entries matching `pattern`, compiled case-insensitively, oldest first
    pub fn search(&self, pattern: &str) -> HistoryResult<Vec<String>> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| HistoryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(self.search_regex(&regex))
    }

    /// Entries matching a prepared regex, used as given
    pub fn search_regex(&self, regex: &Regex) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| regex.is_match(entry))
            .cloned()
            .collect()
    }

    /// Empty the history; the index goes to 0
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.save();
    }

    pub fn get_all(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current navigation index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn is_persistent(&self) -> bool {
        self.writer.is_some()
    }

    /// Wait until every queued save has reached storage
    pub async fn flush(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (ack, done) = oneshot::channel();
        if writer.send(PersistRequest::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    fn save(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        match serde_json::to_string(&self.entries) {
            Ok(payload) => {
                if writer.send(PersistRequest::Save(payload)).is_err() {
                    log::warn!("History writer has stopped; entry kept in memory only");
                }
            }
            Err(e) => log::warn!("Failed to encode command history: {}", e),
        }
    }
}

async fn load_entries(storage: &dyn StorageAdapter, key: &str) -> HistoryResult<Vec<String>> {
    match storage.get(key).await? {
        Some(stored) => serde_json::from_str(&stored).map_err(|source| HistoryError::Decode {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

async fn run_writer(
    storage: Arc<dyn StorageAdapter>,
    key: String,
    mut requests: UnboundedReceiver<PersistRequest>,
) {
    while let Some(request) = requests.recv().await {
        match request {
            PersistRequest::Save(payload) => {
                if let Err(e) = storage.set(&key, &payload).await {
                    log::warn!("Failed to save command history: {}", e);
                }
            }
            PersistRequest::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    log::trace!("History writer for '{}' stopped", key);
}
