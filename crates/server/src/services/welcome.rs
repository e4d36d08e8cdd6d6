//! First-visit welcome message.

use ai_portal_core::SessionStatus;

use crate::storage::{BrowserStorage, StorageError, keys};

/// Whether the welcome message is due, without recording the visit.
///
/// # Errors
///
/// Returns `StorageError` if the marker cannot be read.
pub async fn pending<S: BrowserStorage>(
    storage: &S,
    status: &SessionStatus,
) -> Result<bool, StorageError> {
    if !status.is_authenticated() {
        return Ok(false);
    }
    Ok(storage.get(keys::WELCOME_SEEN).await?.is_none())
}

/// Whether the welcome message should be shown to this browser.
///
/// Only an authenticated session consumes the message: the first call
/// returns `true` and records the visit, later calls return `false`.
///
/// # Errors
///
/// Returns `StorageError` if the marker cannot be read or written.
pub async fn first_visit<S: BrowserStorage>(
    storage: &S,
    status: &SessionStatus,
) -> Result<bool, StorageError> {
    if !pending(storage, status).await? {
        return Ok(false);
    }
    storage.set(keys::WELCOME_SEEN, "true").await?;
    Ok(true)
}

/// Show the welcome message again on the next visit.
///
/// # Errors
///
/// Returns `StorageError` if the marker cannot be removed.
pub async fn reset<S: BrowserStorage>(storage: &S) -> Result<(), StorageError> {
    storage.remove(keys::WELCOME_SEEN).await
}
