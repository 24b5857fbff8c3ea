use crate::core::animation::state::Direction;
use std::time::Duration;

pub(crate) const DEFAULT_STEP: Duration = Duration::from_millis(500);

/// Initial state of an [`AnimationSequencer`](super::AnimationSequencer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Dwell used for every frame until per-frame steps are set.
    pub default_step: Duration,
    pub direction: Direction,
    pub on: bool,
    /// Whether offered domain sets replace the current one.
    pub compute_set: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_step: DEFAULT_STEP,
            direction: Direction::Forward,
            on: false,
            compute_set: true,
        }
    }
}
