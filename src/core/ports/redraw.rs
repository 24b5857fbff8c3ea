pub trait RedrawTrigger: Send + Sync {
    fn request_redraw(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoRedraw;

impl RedrawTrigger for NoRedraw {
    #[inline]
    fn request_redraw(&self) {}
}
