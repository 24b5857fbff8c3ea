#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("step must be > 0, got {0} ms")]
    NonPositiveStep(i64),
    #[error("step {index} must be > 0, got {value} ms")]
    NonPositiveStepAt { index: usize, value: i64 },
    #[error("step list is empty")]
    EmptySteps,
    #[error("invalid save string: {0}")]
    InvalidSaveString(String),
}

impl AnimationError {
    pub fn invalid_save_string(msg: impl Into<String>) -> Self {
        Self::InvalidSaveString(msg.into())
    }
}
