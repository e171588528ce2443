//! Fail-open utilities for housekeeping
//!
//! Use these for operations whose failure must not stop the surrounding
//! work, such as removing one orphaned record during a sweep.
//!
//! DO NOT use fail-open for:
//! - Collector invocations (their failures are the caller's to handle)
//! - Appending observations (a lost line must surface)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use sn1ff_core::fail_open::fail_open;
/// use sn1ff_core::Result;
///
/// async fn remove_record() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let removed = fail_open("sweep::remove", || remove_record()).await;
///     // removed is None if remove_record() failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
