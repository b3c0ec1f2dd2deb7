//! Synchronization utilities for engine state guarded by std locks
//!
//! The engine only holds std locks for short, non-async critical sections
//! (settle slots, listener tables, in-memory storage). Poisoning is either
//! turned into a typed error or recovered from after logging, depending on
//! whether the guarded data can still be trusted.

use std::sync::LockResult;

/// Convert a poisoned lock into an application error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use pulse_cli::core::sync::handle_mutex_poison;
/// use pulse_cli::history::api::StorageError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| StorageError::Unavailable { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

/// Recover the guard from a poisoned lock, logging the event
///
/// Used where the guarded value is always left consistent between
/// statements, so a panic elsewhere cannot corrupt it.
pub fn recover_poison<T>(result: LockResult<T>, context: &str) -> T {
    match result {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Recovering poisoned lock in {}", context);
            poisoned.into_inner()
        }
    }
}
