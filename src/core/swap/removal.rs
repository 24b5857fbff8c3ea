//! Frame-delayed reclamation of hidden slot content.
//!
//! A draw loop that started traversing the scene before a switch request
//! reached it may still be walking the content that just got hidden.
//! Clearing is therefore deferred until the replacement has been visible
//! for at least one full frame: entries only count down once their
//! rendering's switch has been realized, and the scheduler is ticked once
//! per completed frame.

use crate::core::data::rendering_id::RenderingId;
use crate::core::data::slot::REMOVAL_DELAY_FRAMES;
use crate::core::sync::lock;
use std::collections::HashMap;
use std::sync::{Mutex, Weak};
use tracing::debug;

/// The rendering side of a removal entry.
pub trait SlotReclaimer: Send + Sync {
    /// Whether the draw loop has switched away from the hidden slot yet.
    fn switch_realized(&self) -> bool;

    /// Clears a hidden slot and wakes producers waiting for it.
    fn reclaim(&self, slot: usize);
}

struct RemovalEntry {
    target: Weak<dyn SlotReclaimer>,
    countdown: u32,
}

/// One per display; shared by every rendering attached to it.
#[derive(Default)]
pub struct DeferredRemovalScheduler {
    entries: Mutex<HashMap<(RenderingId, usize), RemovalEntry>>,
}

impl std::fmt::Debug for DeferredRemovalScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredRemovalScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl DeferredRemovalScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `slot` of `rendering` for clearing.
    ///
    /// A second request for the same slot before the first fired resets its
    /// countdown instead of queueing a duplicate.
    pub fn request_removal(
        &self,
        rendering: RenderingId,
        slot: usize,
        target: Weak<dyn SlotReclaimer>,
    ) {
        let mut entries = lock(&self.entries);
        match entries.get_mut(&(rendering, slot)) {
            Some(entry) => {
                debug!(%rendering, slot, "removal re-requested, countdown reset");
                entry.countdown = REMOVAL_DELAY_FRAMES;
                entry.target = target;
            }
            None => {
                entries.insert(
                    (rendering, slot),
                    RemovalEntry {
                        target,
                        countdown: REMOVAL_DELAY_FRAMES,
                    },
                );
            }
        }
    }

    /// Advances every realized entry by one completed frame and clears the
    /// slots that are due. Returns how many slots were reclaimed.
    pub fn tick(&self) -> usize {
        let due = {
            let mut entries = lock(&self.entries);
            let mut due = Vec::new();

            entries.retain(|&(rendering, slot), entry| {
                let Some(target) = entry.target.upgrade() else {
                    debug!(%rendering, slot, "dropping removal for released rendering");
                    return false;
                };
                if !target.switch_realized() {
                    return true;
                }
                entry.countdown = entry.countdown.saturating_sub(1);
                if entry.countdown > 0 {
                    return true;
                }
                due.push((rendering, slot, target));
                false
            });

            due
        };

        // Reclaim outside the queue lock: producers woken here may
        // immediately request another removal.
        for (rendering, slot, target) in &due {
            debug!(%rendering, slot, "reclaiming hidden slot");
            target.reclaim(*slot);
        }

        due.len()
    }

    /// Drops every entry of a detached rendering.
    pub fn forget(&self, rendering: RenderingId) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|&(owner, _), _| owner != rendering);
        before - entries.len()
    }

    #[must_use]
    pub fn is_pending(&self, rendering: RenderingId, slot: usize) -> bool {
        lock(&self.entries).contains_key(&(rendering, slot))
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.entries).len()
    }
}
