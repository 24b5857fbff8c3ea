use std::time::Duration;

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ESCALATE_AFTER: u32 = 6;

/// Back-pressure tuning for [`SwapController::submit`](super::SwapController::submit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapConfig {
    /// How long one wait for a free slot lasts before re-checking.
    pub wait_timeout: Duration,
    /// Consecutive timed-out waits before a slow-consumer warning is raised.
    pub escalate_after: u32,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            escalate_after: DEFAULT_ESCALATE_AFTER,
        }
    }
}
