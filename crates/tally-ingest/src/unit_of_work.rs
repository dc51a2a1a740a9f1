//! Store locking and begin/commit/rollback around multi-step changes

use crate::error::IngestError;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use tally_domain::traits::LedgerStore;
use tracing::error;

/// Lock the shared store
pub(crate) fn lock_store<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>, IngestError> {
    store
        .lock()
        .map_err(|e| IngestError::Store(format!("Store lock error: {}", e)))
}

/// Run `work` inside one unit of work
///
/// Commits on success and rolls back on any error. Failures of the store
/// itself (begin, commit, rollback) are reported through `wrap`.
pub(crate) fn atomically<S, T, F>(
    store: &mut S,
    wrap: fn(String) -> IngestError,
    work: F,
) -> Result<T, IngestError>
where
    S: LedgerStore,
    S::Error: Display,
    F: FnOnce(&mut S) -> Result<T, IngestError>,
{
    store
        .begin()
        .map_err(|e| wrap(format!("failed to begin unit of work: {}", e)))?;

    let outcome = work(store).and_then(|value| {
        store
            .commit()
            .map(|()| value)
            .map_err(|e| wrap(format!("failed to commit: {}", e)))
    });

    match outcome {
        Ok(value) => Ok(value),
        Err(err) => match store.rollback() {
            Ok(()) => Err(err),
            Err(rollback_err) => {
                error!(error = %err, rollback_error = %rollback_err, "Rollback failed");
                Err(wrap(format!(
                    "{}; rollback also failed, store may be inconsistent: {}",
                    err, rollback_err
                )))
            }
        },
    }
}
