use std::time::Duration;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawLoopConfig {
    /// Longest pause between frames when no redraw is requested.
    pub frame_interval: Duration,
}

impl Default for DrawLoopConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}
