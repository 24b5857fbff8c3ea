use crate::controllers::display::config::DrawLoopConfig;
use crate::controllers::display::display::Display;
use crate::core::data::rendering_id::RenderingId;
use crate::core::ports::redraw::RedrawTrigger;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Runs [`Display::render_frame`] on a dedicated thread.
///
/// Frames come at most `frame_interval` apart and sooner when a redraw is
/// requested.
pub struct DrawLoop {
    shutdown: Arc<AtomicBool>,
    wake: Arc<dyn RedrawTrigger>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DrawLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawLoop")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl DrawLoop {
    pub fn spawn<C, F>(display: Arc<Display<C>>, config: DrawLoopConfig, mut draw: F) -> Self
    where
        C: Send + Sync + 'static,
        F: FnMut(RenderingId, &C) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let signal = Arc::clone(display.redraw_signal());
        let wake = Arc::clone(&signal) as Arc<dyn RedrawTrigger>;

        let loop_shutdown = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            debug!(interval = ?config.frame_interval, "draw loop started");
            while !loop_shutdown.load(Ordering::Acquire) {
                display.render_frame(&mut draw);
                signal.wait_timeout(config.frame_interval);
            }
            let frames = display.frames_completed();
            debug!(frames, "draw loop stopped");
        });

        Self {
            shutdown,
            wake,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.request_redraw();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DrawLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
