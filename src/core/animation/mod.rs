//! Index-driven switching among precomputed frames.
//!
//! [`AnimationSequencer`] owns the frame index and dwell timing;
//! every switch bound to its control follows through the shared
//! [`ControlSwitchRegistry`](crate::core::control::ControlSwitchRegistry).

pub mod config;
pub mod errors;
pub mod frame_switch;
pub mod sequencer;
pub mod state;

pub use config::AnimationConfig;
pub use errors::AnimationError;
pub use frame_switch::FrameSwitch;
pub use sequencer::AnimationSequencer;
pub use state::{AnimationState, Direction};
