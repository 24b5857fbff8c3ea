use crate::core::actions::cancellation::{CancelToken, Cancelled};
use crate::core::data::rendering_id::RenderingId;
use crate::core::ports::content_builder::BuildError;
use crate::core::ports::redraw::RedrawTrigger;
use crate::core::ports::switch_target::SwitchTarget;
use crate::core::swap::config::SwapConfig;
use crate::core::swap::errors::SwapError;
use crate::core::swap::removal::{DeferredRemovalScheduler, SlotReclaimer};
use crate::core::swap::slot_ring::{SlotRing, SwapStatus};
use crate::core::sync::lock;
use std::sync::{Arc, Condvar, PoisonError, Weak};
use tracing::{debug, warn};

/// Result of a successful [`SwapController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub slot: usize,
    pub hidden: Option<usize>,
    /// Waits for a free slot that timed out before this submit went through.
    pub timed_out_waits: u32,
}

struct RenderingShared<C> {
    id: RenderingId,
    ring: std::sync::Mutex<SlotRing<C>>,
    slot_freed: Condvar,
    switch_target: Arc<dyn SwitchTarget>,
    removals: Arc<DeferredRemovalScheduler>,
    redraw: Arc<dyn RedrawTrigger>,
    config: SwapConfig,
}

impl<C: Send + Sync> SlotReclaimer for RenderingShared<C> {
    fn switch_realized(&self) -> bool {
        lock(&self.ring).switch_realized()
    }

    fn reclaim(&self, slot: usize) {
        let released = lock(&self.ring).reclaim(slot);
        if released.is_some() {
            self.slot_freed.notify_all();
        }
        // `released` drops here, outside the ring lock.
    }
}

/// Owns one rendering's three-slot ring and is the only hand-off point
/// between worker threads and the draw loop.
///
/// Cloning is cheap and yields another handle onto the same ring.
pub struct SwapController<C> {
    shared: Arc<RenderingShared<C>>,
}

impl<C> Clone for SwapController<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C> std::fmt::Debug for SwapController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapController")
            .field("id", &self.shared.id)
            .finish_non_exhaustive()
    }
}

impl<C: Send + Sync + 'static> SwapController<C> {
    #[must_use]
    pub fn new(
        switch_target: Arc<dyn SwitchTarget>,
        removals: Arc<DeferredRemovalScheduler>,
        redraw: Arc<dyn RedrawTrigger>,
        config: SwapConfig,
    ) -> Self {
        let id = RenderingId::next();
        debug!(rendering = %id, children = switch_target.child_count(), "slot ring created");

        Self {
            shared: Arc::new(RenderingShared {
                id,
                ring: std::sync::Mutex::new(SlotRing::new()),
                slot_freed: Condvar::new(),
                switch_target,
                removals,
                redraw,
                config,
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> RenderingId {
        self.shared.id
    }

    /// Installs freshly built content and requests that it become visible.
    ///
    /// Blocks the calling worker while the previously hidden slot is still
    /// waiting for its removal frame. Each wait is bounded by
    /// [`SwapConfig::wait_timeout`]; timeouts are counted and re-waited, and
    /// a warning is raised every [`SwapConfig::escalate_after`] consecutive
    /// timeouts. Returns early if `cancel` fires or the rendering detaches.
    #[tracing::instrument(level = "debug", skip_all, fields(rendering = %self.shared.id))]
    pub fn submit(&self, content: C, cancel: &dyn CancelToken) -> Result<SubmitReceipt, SwapError> {
        let shared = &self.shared;
        let mut ring = lock(&shared.ring);
        let mut timed_out_waits = 0u32;

        while !ring.is_detached() && ring.removal_outstanding() {
            if cancel.is_cancelled() {
                return Err(SwapError::Cancelled(Cancelled));
            }

            let (guard, wait) = shared
                .slot_freed
                .wait_timeout(ring, shared.config.wait_timeout)
                .unwrap_or_else(PoisonError::into_inner);
            ring = guard;

            if wait.timed_out() && ring.removal_outstanding() {
                timed_out_waits += 1;
                let total = ring.record_slow_consumer_timeout();
                let escalate_after = shared.config.escalate_after.max(1);
                if timed_out_waits % escalate_after == 0 {
                    warn!(
                        timed_out_waits,
                        total,
                        "slow consumer: draw loop has not freed a slot, still waiting"
                    );
                } else {
                    debug!(timed_out_waits, "waiting for a free slot timed out, retrying");
                }
            }
        }

        if ring.is_detached() {
            return Err(SwapError::Detached(shared.id));
        }
        if cancel.is_cancelled() {
            return Err(SwapError::Cancelled(Cancelled));
        }

        let placement = ring.place(Arc::new(content));
        drop(ring);

        debug!(slot = placement.shown, hidden = ?placement.hidden, "content swapped in");

        if let Some(hidden) = placement.hidden {
            self.shared
                .removals
                .request_removal(shared.id, hidden, self.reclaimer());
        }
        shared.redraw.request_redraw();

        Ok(SubmitReceipt {
            slot: placement.shown,
            hidden: placement.hidden,
            timed_out_waits,
        })
    }

    /// Records a failed build. Visible content is left as it is.
    pub fn report_failure(&self, error: BuildError) {
        if error.is_cancelled() {
            return;
        }
        warn!(rendering = %self.shared.id, %error, "build failed, keeping previous content");
        lock(&self.shared.ring).record_failure(error);
        self.shared.redraw.request_redraw();
    }

    /// Draw-loop side: applies a pending visibility switch, if any.
    pub fn realize_pending_switch(&self) -> Option<usize> {
        let index = lock(&self.shared.ring).take_pending_switch()?;
        self.shared.switch_target.set_visible_child(index);
        debug!(rendering = %self.shared.id, slot = index, "switch realized");
        Some(index)
    }

    /// Draw-loop side: the content currently presented.
    #[must_use]
    pub fn visible_content(&self) -> Option<Arc<C>> {
        lock(&self.shared.ring).visible_content()
    }

    #[must_use]
    pub fn status(&self) -> SwapStatus {
        lock(&self.shared.ring).status()
    }

    #[must_use]
    pub fn is_feasible(&self) -> bool {
        lock(&self.shared.ring).status().feasible
    }

    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        lock(&self.shared.ring).invariants_hold()
    }

    /// Wakes producers blocked in `submit` so they re-check cancellation.
    ///
    /// Passes through the ring lock first: a producer that has checked its
    /// token but not yet parked still holds the lock, so the notify cannot
    /// slip in between.
    pub fn wake_waiters(&self) {
        drop(lock(&self.shared.ring));
        self.shared.slot_freed.notify_all();
    }

    /// Discards all slot content immediately and fails every pending or
    /// future `submit` with [`SwapError::Detached`].
    pub fn detach(&self) {
        let released = lock(&self.shared.ring).detach();
        self.shared.slot_freed.notify_all();
        let forgotten = self.shared.removals.forget(self.shared.id);
        debug!(
            rendering = %self.shared.id,
            released = released.len(),
            forgotten,
            "slot ring detached"
        );
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        lock(&self.shared.ring).is_detached()
    }

    fn reclaimer(&self) -> Weak<dyn SlotReclaimer> {
        let shared: Arc<dyn SlotReclaimer> = Arc::clone(&self.shared) as Arc<dyn SlotReclaimer>;
        Arc::downgrade(&shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::cancellation::{CancelFlag, NeverCancel};
    use crate::core::data::index_switch::IndexSwitch;
    use crate::core::data::slot::SlotState::{Empty, HiddenPending, Visible};
    use crate::core::ports::redraw::NoRedraw;
    use std::thread;
    use std::time::{Duration, Instant};

    fn controller(config: SwapConfig) -> (SwapController<&'static str>, Arc<DeferredRemovalScheduler>, Arc<IndexSwitch>) {
        let switch = Arc::new(IndexSwitch::new(3));
        let removals = Arc::new(DeferredRemovalScheduler::new());
        let controller = SwapController::new(
            Arc::clone(&switch) as Arc<dyn SwitchTarget>,
            Arc::clone(&removals),
            Arc::new(NoRedraw),
            config,
        );
        (controller, removals, switch)
    }

    /// What one display frame does for a single rendering.
    fn frame(controller: &SwapController<&'static str>, removals: &DeferredRemovalScheduler) {
        controller.realize_pending_switch();
        removals.tick();
    }

    #[test]
    fn documented_three_submit_scenario() {
        let (controller, removals, switch) = controller(SwapConfig::default());

        controller.submit("A", &NeverCancel).unwrap();
        assert_eq!(controller.status().states, [Visible, Empty, Empty]);
        frame(&controller, &removals);
        assert_eq!(switch.visible_child(), Some(0));

        controller.submit("B", &NeverCancel).unwrap();
        assert_eq!(controller.status().states, [HiddenPending, Visible, Empty]);

        frame(&controller, &removals);
        assert_eq!(controller.status().states, [Empty, Visible, Empty]);
        assert_eq!(switch.visible_child(), Some(1));

        let receipt = controller.submit("C", &NeverCancel).unwrap();
        assert_eq!(receipt.slot, 2);
        assert_eq!(controller.status().states, [Empty, HiddenPending, Visible]);
        assert!(controller.invariants_hold());
    }

    #[test]
    fn hidden_slot_survives_until_switch_is_realized() {
        let (controller, removals, _) = controller(SwapConfig::default());
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);
        controller.submit("B", &NeverCancel).unwrap();

        // A tick without the draw loop switching must not clear the old slot.
        removals.tick();
        assert_eq!(controller.status().states[0], HiddenPending);
        assert_eq!(controller.visible_content().as_deref(), Some(&"A"));

        frame(&controller, &removals);
        assert_eq!(controller.status().states[0], Empty);
        assert_eq!(controller.visible_content().as_deref(), Some(&"B"));
    }

    #[test]
    fn blocked_submit_resumes_when_slot_is_reclaimed() {
        let (controller, removals, _) = controller(SwapConfig::default());
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);
        controller.submit("B", &NeverCancel).unwrap();

        let producer = {
            let controller = controller.clone();
            thread::spawn(move || controller.submit("C", &NeverCancel))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished(), "producer should be blocked");

        frame(&controller, &removals);

        let receipt = producer.join().unwrap().unwrap();
        assert_eq!(receipt.slot, 2);
        assert_eq!(receipt.timed_out_waits, 0);
    }

    #[test]
    fn slow_consumer_timeouts_are_counted_and_retried() {
        let config = SwapConfig {
            wait_timeout: Duration::from_millis(10),
            escalate_after: 2,
        };
        let (controller, removals, _) = controller(config);
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);
        controller.submit("B", &NeverCancel).unwrap();

        let producer = {
            let controller = controller.clone();
            thread::spawn(move || controller.submit("C", &NeverCancel))
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        while controller.status().slow_consumer_timeouts < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        frame(&controller, &removals);

        let receipt = producer.join().unwrap().unwrap();
        assert!(receipt.timed_out_waits >= 3);
        assert!(controller.status().slow_consumer_timeouts >= 3);
    }

    #[test]
    fn cancelled_producer_stops_waiting() {
        let (controller, removals, _) = controller(SwapConfig::default());
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);
        controller.submit("B", &NeverCancel).unwrap();

        let flag = Arc::new(CancelFlag::new());
        let producer = {
            let controller = controller.clone();
            let flag = Arc::clone(&flag);
            thread::spawn(move || controller.submit("C", flag.as_ref()))
        };

        thread::sleep(Duration::from_millis(20));
        flag.cancel();
        controller.wake_waiters();

        let result = producer.join().unwrap();
        assert_eq!(result, Err(SwapError::Cancelled(Cancelled)));
        assert_eq!(controller.status().states, [HiddenPending, Visible, Empty]);
    }

    #[test]
    fn detach_unblocks_producers_and_discards_content() {
        let (controller, removals, _) = controller(SwapConfig::default());
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);
        controller.submit("B", &NeverCancel).unwrap();

        let producer = {
            let controller = controller.clone();
            thread::spawn(move || controller.submit("C", &NeverCancel))
        };
        thread::sleep(Duration::from_millis(20));

        controller.detach();

        assert_eq!(
            producer.join().unwrap(),
            Err(SwapError::Detached(controller.id()))
        );
        assert_eq!(controller.status().states, [Empty, Empty, Empty]);
        assert_eq!(removals.pending(), 0);
        assert!(controller.visible_content().is_none());
    }

    #[test]
    fn failure_keeps_visible_content() {
        let (controller, removals, _) = controller(SwapConfig::default());
        controller.submit("A", &NeverCancel).unwrap();
        frame(&controller, &removals);

        controller.report_failure(BuildError::type_mismatch("expected a field"));

        assert!(!controller.is_feasible());
        assert_eq!(controller.visible_content().as_deref(), Some(&"A"));
        assert_eq!(
            controller.status().last_error,
            Some(BuildError::type_mismatch("expected a field"))
        );
    }

    #[test]
    fn cancellation_reports_are_ignored() {
        let (controller, _, _) = controller(SwapConfig::default());

        controller.report_failure(BuildError::Cancelled(Cancelled));

        assert!(controller.is_feasible());
        assert_eq!(controller.status().last_error, None);
    }

    #[test]
    fn producer_and_draw_loop_keep_invariants_under_load() {
        let (controller, removals, _) = controller(SwapConfig::default());
        let submissions = 50;

        let producer = {
            let controller = controller.clone();
            thread::spawn(move || {
                for _ in 0..submissions {
                    controller.submit("frame", &NeverCancel).unwrap();
                }
            })
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        while !producer.is_finished() && Instant::now() < deadline {
            frame(&controller, &removals);
            assert!(controller.invariants_hold());
            thread::sleep(Duration::from_micros(200));
        }
        producer.join().unwrap();

        // Drain: the last hidden slot is reclaimed within one more frame.
        frame(&controller, &removals);
        frame(&controller, &removals);
        let states = controller.status().states;
        assert_eq!(states.iter().filter(|s| **s == Visible).count(), 1);
        assert_eq!(states.iter().filter(|s| **s == HiddenPending).count(), 0);
    }

    #[test]
    fn wake_waiters_reaches_a_producer_that_is_about_to_park() {
        let config = SwapConfig {
            wait_timeout: Duration::from_secs(3),
            ..SwapConfig::default()
        };

        for _ in 0..20 {
            let (controller, removals, _) = controller(config);
            controller.submit("A", &NeverCancel).unwrap();
            frame(&controller, &removals);
            controller.submit("B", &NeverCancel).unwrap();

            let superseded = Arc::new(std::sync::atomic::AtomicBool::new(false));
            let producer = {
                let controller = controller.clone();
                let superseded = Arc::clone(&superseded);
                thread::spawn(move || {
                    let cancel = move || superseded.load(std::sync::atomic::Ordering::SeqCst);
                    controller.submit("C", &cancel)
                })
            };

            let start = Instant::now();
            superseded.store(true, std::sync::atomic::Ordering::SeqCst);
            controller.wake_waiters();
            let result = producer.join().unwrap();

            assert!(matches!(result, Err(SwapError::Cancelled(_))));
            assert!(start.elapsed() < Duration::from_secs(2));
            assert_eq!(controller.status().states, [HiddenPending, Visible, Empty]);
        }
    }
}
