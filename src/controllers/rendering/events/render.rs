use crate::controllers::rendering::data::swap_data::SwapData;
use crate::controllers::rendering::errors::render::RenderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Swapped(SwapData),
    Failed(RenderError),
}

impl RenderEvent {
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Swapped(data) => data.generation,
            Self::Failed(error) => error.generation,
        }
    }
}
