use crate::core::actions::cancellation::Cancelled;
use crate::core::data::rendering_id::RenderingId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    /// The rendering left the display; the content was discarded.
    #[error("rendering {0} is detached")]
    Detached(RenderingId),
    /// The producer's inputs changed while it waited for a free slot.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
