//! Purpose: Per-flow re-entrancy guards for async operations.
//! Exports: `InFlight`, `InFlightGuard`, `lock`.
//! Invariants: At most one guard per `InFlight` exists at a time.
//! Invariants: Dropping the guard releases the flow, including when its future is dropped.
use crate::core::error::{Error, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl InFlight {
    pub(crate) const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub(crate) fn enter(&self, flow: &str) -> Result<InFlightGuard<'_>, Error> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                Error::new(ErrorKind::Busy)
                    .with_message(format!("{flow} already in progress"))
                    .with_hint("Wait for the pending request to finish.")
            })?;
        Ok(InFlightGuard(&self.0))
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State locks are never held across an await, so a poisoned lock still holds consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}
