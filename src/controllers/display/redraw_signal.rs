use crate::core::ports::redraw::RedrawTrigger;
use crate::core::sync::lock;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Latching redraw flag the draw loop sleeps on between frames.
#[derive(Debug, Default)]
pub struct RedrawSignal {
    requested: Mutex<bool>,
    wake: Condvar,
}

impl RedrawSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a redraw is requested or `timeout` passes, then clears
    /// the flag. Returns whether a redraw was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = lock(&self.requested);
        let (mut guard, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        *lock(&self.requested)
    }
}

impl RedrawTrigger for RedrawSignal {
    fn request_redraw(&self) {
        *lock(&self.requested) = true;
        self.wake.notify_all();
    }
}
