use crate::core::data::rendering_id::RenderingId;
use crate::core::ports::content_builder::BuildError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rendering {rendering}, request {generation}: {source}")]
pub struct RenderError {
    pub rendering: RenderingId,
    pub generation: u64,
    pub source: BuildError,
}
