use crate::core::data::rendering_id::RenderingId;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapData {
    pub rendering: RenderingId,
    pub generation: u64,
    pub slot: usize,
    pub build_duration: Duration,
    /// Waits for a free slot that timed out before the swap went through.
    pub timed_out_waits: u32,
}
