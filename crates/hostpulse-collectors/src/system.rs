//! Shared helper for collectors backed by blocking sysinfo state.

use std::sync::{Arc, Mutex, TryLockError};

use hostpulse_core::error::ErrorKind;
use hostpulse_core::{AppError, AppResult};

/// Run `read` against `state` on the blocking pool.
///
/// Fails immediately if a previous read still holds the state; a collector
/// never queues behind itself.
pub(crate) async fn read_blocking<S, T, F>(
    state: &Arc<Mutex<S>>,
    name: &'static str,
    read: F,
) -> AppResult<T>
where
    S: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut S) -> AppResult<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = match state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                return Err(AppError::collector(format!(
                    "{name}: previous read still running"
                )));
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        read(&mut guard)
    })
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Collector, format!("{name}: read aborted"), e))?
}
