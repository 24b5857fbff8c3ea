//! Unbuffered path for direct manipulation feedback.

pub mod channel;

pub use channel::{DirectChannel, DirectError};
