//! Tests for the history module

use super::error::{StorageError, StorageResult};
use super::history::{CommandHistory, HistoryOptions};
use super::storage::{MemoryStorage, StorageAdapter};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

fn history_with_capacity(max_size: usize) -> CommandHistory {
    CommandHistory::new(HistoryOptions {
        max_size,
        ..HistoryOptions::default()
    })
}

fn persistent_options() -> HistoryOptions {
    HistoryOptions {
        persist: true,
        ..HistoryOptions::default()
    }
}

#[cfg(test)]
mod buffer_tests {
    use super::*;

    #[test]
    fn test_add_trims_and_ignores_blank_input() {
        let mut history = CommandHistory::default();
        history.add("  greet World  ");
        history.add("   ");
        history.add("");

        assert_eq!(history.get_all(), vec!["greet World"]);
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn test_consecutive_duplicate_is_not_stored() {
        let mut history = CommandHistory::default();
        history.add("x");
        history.add("x");
        assert_eq!(history.get_all(), vec!["x"]);

        history.add("y");
        history.add("x");
        assert_eq!(history.get_all(), vec!["x", "y", "x"]);
    }

    #[test]
    fn test_duplicate_resets_navigation_index() {
        let mut history = CommandHistory::default();
        history.add("a");
        history.add("b");
        history.get_previous();
        history.get_previous();
        assert_eq!(history.index(), 0);

        history.add("b");
        assert_eq!(history.index(), 2);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = history_with_capacity(3);
        for command in ["one", "two", "three", "four", "five"] {
            history.add(command);
            assert!(history.len() <= 3);
        }

        assert_eq!(history.get_all(), vec!["three", "four", "five"]);
        assert_eq!(history.index(), 3);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut history = history_with_capacity(0);
        history.add("help");
        assert!(history.is_empty());
    }
}

#[cfg(test)]
mod navigation_tests {
    use super::*;

    #[test]
    fn test_previous_on_empty_history() {
        let mut history = CommandHistory::default();
        assert_eq!(history.get_previous(), None);
        assert_eq!(history.get_next(), None);
    }

    #[test]
    fn test_previous_sticks_at_oldest_entry() {
        let mut history = CommandHistory::default();
        history.add("first");
        history.add("second");

        assert_eq!(history.get_previous(), Some("second"));
        assert_eq!(history.get_previous(), Some("first"));
        assert_eq!(history.get_previous(), Some("first"));
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_back_then_forward_returns_to_live_line() {
        let mut history = CommandHistory::default();
        let commands = ["a", "b", "c", "d"];
        for command in commands {
            history.add(command);
        }

        for _ in 0..commands.len() {
            assert!(history.get_previous().is_some());
        }
        // n - 1 forward steps still land on entries
        for expected in ["b", "c", "d"] {
            assert_eq!(history.get_next(), Some(expected));
        }
        // the n-th step leaves the history
        assert_eq!(history.get_next(), None);
        assert_eq!(history.index(), commands.len());
    }

    #[test]
    fn test_reset_index() {
        let mut history = CommandHistory::default();
        history.add("a");
        history.add("b");
        history.get_previous();
        history.reset_index();

        assert_eq!(history.index(), 2);
        assert_eq!(history.get_previous(), Some("b"));
    }

    #[test]
    fn test_clear_resets_index_to_zero() {
        let mut history = CommandHistory::default();
        history.add("a");
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.index(), 0);
        assert_eq!(history.get_previous(), None);
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::history::error::HistoryError;

    fn sample() -> CommandHistory {
        let mut history = CommandHistory::default();
        for command in ["greet Ada", "list users", "GREET Bob", "help"] {
            history.add(command);
        }
        history
    }

    #[test]
    fn test_string_pattern_is_case_insensitive() {
        let matches = sample().search("greet").unwrap();
        assert_eq!(matches, vec!["greet Ada", "GREET Bob"]);
    }

    #[test]
    fn test_regex_is_used_as_given() {
        let case_sensitive = Regex::new("^greet").unwrap();
        assert_eq!(sample().search_regex(&case_sensitive), vec!["greet Ada"]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let error = sample().search("(unclosed").unwrap_err();
        assert!(matches!(error, HistoryError::InvalidPattern { .. }));
    }
}

/// Storage whose writes always fail
struct FailingStorage;

#[async_trait]
impl StorageAdapter for FailingStorage {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable {
            message: "offline".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable {
            message: "offline".to_string(),
        })
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_saves_after_each_mutation() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history = CommandHistory::with_storage(persistent_options(), storage.clone()).await;
        assert!(history.is_persistent());

        history.add("greet Ada");
        history.add("help");
        history.flush().await;
        assert_eq!(
            storage.get("pulse-cli-history").await.unwrap().as_deref(),
            Some(r#"["greet Ada","help"]"#)
        );

        history.clear();
        history.flush().await;
        assert_eq!(
            storage.get("pulse-cli-history").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_load_keeps_newest_entries() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("pulse-cli-history", r#"["a","b","c","d"]"#)
            .await
            .unwrap();

        let options = HistoryOptions {
            max_size: 2,
            ..persistent_options()
        };
        let mut history = CommandHistory::with_storage(options, storage).await;

        assert_eq!(history.get_all(), vec!["c", "d"]);
        assert_eq!(history.index(), 2);
        assert_eq!(history.get_previous(), Some("d"));
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let storage = Arc::new(MemoryStorage::new());
        let options = HistoryOptions {
            storage_key: "session-two".to_string(),
            ..persistent_options()
        };
        let mut history = CommandHistory::with_storage(options, storage.clone()).await;
        history.add("help");
        history.flush().await;

        assert!(storage.get("session-two").await.unwrap().is_some());
        assert!(storage.get("pulse-cli-history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_stored_value_is_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("pulse-cli-history", "{not json")
            .await
            .unwrap();

        let history = CommandHistory::with_storage(persistent_options(), storage).await;
        assert!(history.is_empty());
        assert!(history.is_persistent());
    }

    #[tokio::test]
    async fn test_storage_failures_stay_silent() {
        let mut history =
            CommandHistory::with_storage(persistent_options(), Arc::new(FailingStorage)).await;

        history.add("help");
        history.flush().await;
        assert_eq!(history.get_all(), vec!["help"]);
    }

    #[tokio::test]
    async fn test_persist_disabled_never_touches_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut history =
            CommandHistory::with_storage(HistoryOptions::default(), storage.clone()).await;

        history.add("help");
        history.flush().await;
        assert!(!history.is_persistent());
        assert!(storage.get("pulse-cli-history").await.unwrap().is_none());
    }
}
