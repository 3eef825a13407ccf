use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Per-thread wake signal.
///
/// A worker whose previous cycle produced no activity parks on its signal
/// with a bounded timeout instead of spinning; senders targeting one of the
/// worker's processors notify it. The pending flag absorbs a notification
/// that lands between the worker deciding to park and actually parking.
#[derive(Debug, Default)]
pub struct WakeSignal {
    pending: Mutex<bool>,
    cv: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the owning thread if it is parked, or let its next park return
    /// immediately.
    pub fn notify(&self) {
        let mut pending = self.lock();
        *pending = true;
        self.cv.notify_one();
    }

    /// Park for at most `timeout`. Returns `true` when a notification was
    /// consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut pending = self.lock();
        if !*pending {
            pending = self
                .cv
                .wait_timeout(pending, timeout)
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .0;
        }
        let woken = *pending;
        *pending = false;
        woken
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
