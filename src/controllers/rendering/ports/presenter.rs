use crate::controllers::rendering::events::render::RenderEvent;
use crate::core::data::rendering_id::RenderingId;

pub trait RenderPresenterPort: Send + Sync {
    fn present(&self, event: RenderEvent);

    /// Called once a rendering has detached and will send no more events.
    fn forget(&self, _rendering: RenderingId) {}
}
