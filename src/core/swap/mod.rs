//! Tear-free content replacement for live renderings.
//!
//! Each rendering owns a ring of three slots. Workers hand finished content
//! to [`SwapController::submit`], the draw loop realizes the resulting
//! visibility switch at the start of its next frame, and the
//! [`DeferredRemovalScheduler`] clears the slot that was hidden once a full
//! frame has completed with the replacement visible.

pub mod config;
pub mod errors;
pub mod removal;
pub mod slot_ring;
pub mod swap_controller;

pub use config::SwapConfig;
pub use errors::SwapError;
pub use removal::{DeferredRemovalScheduler, SlotReclaimer};
pub use slot_ring::{Placement, SlotRing, SwapStatus};
pub use swap_controller::{SubmitReceipt, SwapController};
