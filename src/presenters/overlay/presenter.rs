use crate::controllers::rendering::events::render::RenderEvent;
use crate::controllers::rendering::ports::presenter::RenderPresenterPort;
use crate::core::data::rendering_id::RenderingId;
use crate::core::sync::lock;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Keeps the latest build error of each rendering for an on-screen overlay.
///
/// A rendering's message is cleared as soon as it swaps in new content.
#[derive(Debug, Default)]
pub struct OverlayPresenter {
    overlays: Mutex<BTreeMap<RenderingId, String>>,
    last_presented_generation: Mutex<BTreeMap<RenderingId, u64>>,
    swaps: AtomicU64,
    failures: AtomicU64,
}

impl OverlayPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn overlay(&self, rendering: RenderingId) -> Option<String> {
        lock(&self.overlays).get(&rendering).cloned()
    }

    /// Every active overlay, oldest rendering first.
    #[must_use]
    pub fn overlays(&self) -> Vec<(RenderingId, String)> {
        lock(&self.overlays)
            .iter()
            .map(|(id, message)| (*id, message.clone()))
            .collect()
    }

    pub fn dismiss(&self, rendering: RenderingId) -> bool {
        lock(&self.overlays).remove(&rendering).is_some()
    }

    /// Number of renderings with per-rendering bookkeeping still held.
    #[must_use]
    pub fn tracked_renderings(&self) -> usize {
        lock(&self.last_presented_generation).len()
    }

    #[must_use]
    pub fn swaps_presented(&self) -> u64 {
        self.swaps.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn failures_presented(&self) -> u64 {
        self.failures.load(Ordering::Acquire)
    }

    /// Drops events older than the newest one already shown for a rendering.
    fn is_stale(&self, rendering: RenderingId, generation: u64) -> bool {
        let mut last = lock(&self.last_presented_generation);
        let entry = last.entry(rendering).or_insert(0);
        if generation < *entry {
            return true;
        }
        *entry = generation;
        false
    }
}

impl RenderPresenterPort for OverlayPresenter {
    fn present(&self, event: RenderEvent) {
        match event {
            RenderEvent::Swapped(data) => {
                if self.is_stale(data.rendering, data.generation) {
                    return;
                }
                debug!(
                    rendering = %data.rendering,
                    generation = data.generation,
                    slot = data.slot,
                    build_ms = data.build_duration.as_millis() as u64,
                    "content swapped"
                );
                if data.timed_out_waits > 0 {
                    warn!(
                        rendering = %data.rendering,
                        timed_out_waits = data.timed_out_waits,
                        "swap was delayed by a slow draw loop"
                    );
                }
                lock(&self.overlays).remove(&data.rendering);
                self.swaps.fetch_add(1, Ordering::AcqRel);
            }
            RenderEvent::Failed(error) => {
                if self.is_stale(error.rendering, error.generation) {
                    return;
                }
                warn!(%error, "build failed");
                lock(&self.overlays).insert(error.rendering, error.source.to_string());
                self.failures.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    fn forget(&self, rendering: RenderingId) {
        lock(&self.overlays).remove(&rendering);
        lock(&self.last_presented_generation).remove(&rendering);
        debug!(%rendering, "overlay state released");
    }
}
