use crate::controllers::display::redraw_signal::RedrawSignal;
use crate::core::data::rendering_id::RenderingId;
use crate::core::ports::redraw::RedrawTrigger;
use crate::core::ports::switch_target::SwitchTarget;
use crate::core::swap::{DeferredRemovalScheduler, SwapConfig, SwapController};
use crate::core::sync::lock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, trace};

/// What one call to [`Display::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub switches: usize,
    pub drawn: usize,
    pub reclaimed: usize,
}

/// The scene a draw loop presents: every attached rendering plus the
/// removal scheduler they share.
pub struct Display<C> {
    renderings: Mutex<Vec<SwapController<C>>>,
    removals: Arc<DeferredRemovalScheduler>,
    redraw: Arc<RedrawSignal>,
    swap_config: SwapConfig,
    frames_completed: AtomicU64,
}

impl<C> std::fmt::Debug for Display<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("renderings", &lock(&self.renderings).len())
            .field("removals", &self.removals)
            .field("frames_completed", &self.frames_completed())
            .finish()
    }
}

impl<C: Send + Sync + 'static> Default for Display<C> {
    fn default() -> Self {
        Self::new(SwapConfig::default())
    }
}

impl<C> Display<C> {
    #[must_use]
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed.load(Ordering::Acquire)
    }
}

impl<C: Send + Sync + 'static> Display<C> {
    #[must_use]
    pub fn new(swap_config: SwapConfig) -> Self {
        Self {
            renderings: Mutex::new(Vec::new()),
            removals: Arc::new(DeferredRemovalScheduler::new()),
            redraw: Arc::new(RedrawSignal::new()),
            swap_config,
            frames_completed: AtomicU64::new(0),
        }
    }

    /// Creates the slot ring of a new rendering presented through
    /// `switch_target`.
    pub fn attach(&self, switch_target: Arc<dyn SwitchTarget>) -> SwapController<C> {
        let controller = SwapController::new(
            switch_target,
            Arc::clone(&self.removals),
            Arc::clone(&self.redraw) as Arc<dyn RedrawTrigger>,
            self.swap_config,
        );
        info!(rendering = %controller.id(), "rendering attached");
        lock(&self.renderings).push(controller.clone());
        controller
    }

    /// Stops presenting a rendering. Returns `false` if it was not attached.
    pub fn remove(&self, rendering: RenderingId) -> bool {
        let mut renderings = lock(&self.renderings);
        let before = renderings.len();
        renderings.retain(|controller| controller.id() != rendering);
        let removed = renderings.len() != before;
        if removed {
            info!(%rendering, "rendering removed from display");
        }
        removed
    }

    #[must_use]
    pub fn rendering_count(&self) -> usize {
        lock(&self.renderings).len()
    }

    #[must_use]
    pub fn removals(&self) -> &Arc<DeferredRemovalScheduler> {
        &self.removals
    }

    #[must_use]
    pub fn redraw_signal(&self) -> &Arc<RedrawSignal> {
        &self.redraw
    }

    /// Presents one frame.
    ///
    /// Pending visibility switches are realized first, then `draw` sees the
    /// visible content of every rendering, and finally the removal scheduler
    /// is ticked once for the completed frame. Never waits on workers.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn render_frame(&self, mut draw: impl FnMut(RenderingId, &C)) -> FrameReport {
        let renderings = lock(&self.renderings).clone();

        let switches = renderings
            .iter()
            .filter(|controller| controller.realize_pending_switch().is_some())
            .count();

        let mut drawn = 0;
        for controller in &renderings {
            if let Some(content) = controller.visible_content() {
                draw(controller.id(), &content);
                drawn += 1;
            }
        }

        let reclaimed = self.removals.tick();
        let frame = self.frames_completed.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(frame, switches, drawn, reclaimed, "frame completed");

        FrameReport {
            frame,
            switches,
            drawn,
            reclaimed,
        }
    }
}
