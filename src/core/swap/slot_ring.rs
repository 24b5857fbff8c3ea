use crate::core::data::slot::{SLOT_COUNT, Slot, SlotState};
use crate::core::ports::content_builder::BuildError;
use std::sync::Arc;

/// Where a submission landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub shown: usize,
    /// Slot that was visible before and now awaits removal.
    pub hidden: Option<usize>,
}

/// Point-in-time copy of a ring's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStatus {
    pub states: [SlotState; SLOT_COUNT],
    pub current_index: usize,
    pub actual_index: Option<usize>,
    pub pending_switch: Option<usize>,
    pub feasible: bool,
    pub last_error: Option<BuildError>,
    pub slow_consumer_timeouts: u64,
    pub detached: bool,
}

/// The slot state machine of one rendering, without any locking.
///
/// `current_index` is the slot most recently filled (the one that should be
/// visible); `actual_index` is the slot the draw loop has actually switched
/// to. They differ only while a switch request is pending.
#[derive(Debug)]
pub struct SlotRing<C> {
    slots: [Slot<C>; SLOT_COUNT],
    current_index: usize,
    actual_index: Option<usize>,
    pending_switch: Option<usize>,
    feasible: bool,
    last_error: Option<BuildError>,
    slow_consumer_timeouts: u64,
    detached: bool,
}

impl<C> Default for SlotRing<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SlotRing<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::default()),
            current_index: 0,
            actual_index: None,
            pending_switch: None,
            feasible: true,
            last_error: None,
            slow_consumer_timeouts: 0,
            detached: false,
        }
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> &Slot<C> {
        &self.slots[index % SLOT_COUNT]
    }

    #[must_use]
    pub fn state(&self, index: usize) -> SlotState {
        self.slot(index).state()
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        self.slots.iter().any(|s| s.state() == SlotState::Visible)
    }

    #[must_use]
    pub fn next_index(&self) -> usize {
        (self.current_index + 1) % SLOT_COUNT
    }

    /// True while a hidden slot is still waiting for its removal frame.
    ///
    /// New content is only accepted once this clears, which keeps at most
    /// one slot hidden-pending and at most one switch request in flight.
    #[must_use]
    pub fn removal_outstanding(&self) -> bool {
        self.slots
            .iter()
            .any(|s| s.state() == SlotState::HiddenPending)
    }

    #[must_use]
    pub fn can_accept(&self) -> bool {
        !self.detached && !self.removal_outstanding()
    }

    /// Installs `content` and retires the previously visible slot.
    ///
    /// Callers must check [`can_accept`](Self::can_accept) first.
    pub fn place(&mut self, content: Arc<C>) -> Placement {
        debug_assert!(self.can_accept(), "place called while a removal is outstanding");

        let placement = if self.has_content() {
            let previous = self.current_index;
            let next = self.next_index();
            self.slots[next].show(content);
            self.slots[previous].hide();
            self.current_index = next;
            Placement {
                shown: next,
                hidden: Some(previous),
            }
        } else {
            self.slots[0].show(content);
            self.current_index = 0;
            Placement {
                shown: 0,
                hidden: None,
            }
        };

        self.pending_switch = Some(placement.shown);
        self.feasible = true;
        self.last_error = None;

        debug_assert!(self.invariants_hold());
        placement
    }

    /// Hands the pending visibility switch to the draw loop.
    pub fn take_pending_switch(&mut self) -> Option<usize> {
        let index = self.pending_switch.take()?;
        self.actual_index = Some(index);
        Some(index)
    }

    #[must_use]
    pub fn switch_realized(&self) -> bool {
        self.pending_switch.is_none()
    }

    /// Empties a hidden-pending slot. Other states are left untouched.
    pub fn reclaim(&mut self, index: usize) -> Option<Arc<C>> {
        let slot = &mut self.slots[index % SLOT_COUNT];
        if slot.state() != SlotState::HiddenPending {
            return None;
        }
        slot.clear()
    }

    /// Content of the slot the draw loop currently shows.
    #[must_use]
    pub fn visible_content(&self) -> Option<Arc<C>> {
        self.actual_index
            .and_then(|index| self.slots[index].content())
            .cloned()
    }

    pub fn record_failure(&mut self, error: BuildError) {
        self.feasible = false;
        self.last_error = Some(error);
    }

    pub fn record_slow_consumer_timeout(&mut self) -> u64 {
        self.slow_consumer_timeouts += 1;
        self.slow_consumer_timeouts
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Releases every slot at once. Returns the content so it can be dropped
    /// outside the caller's lock.
    pub fn detach(&mut self) -> Vec<Arc<C>> {
        self.detached = true;
        self.pending_switch = None;
        self.actual_index = None;
        self.slots.iter_mut().filter_map(Slot::clear).collect()
    }

    #[must_use]
    pub fn status(&self) -> SwapStatus {
        SwapStatus {
            states: std::array::from_fn(|i| self.slots[i].state()),
            current_index: self.current_index,
            actual_index: self.actual_index,
            pending_switch: self.pending_switch,
            feasible: self.feasible,
            last_error: self.last_error.clone(),
            slow_consumer_timeouts: self.slow_consumer_timeouts,
            detached: self.detached,
        }
    }

    /// At most one visible and one hidden-pending slot; exactly one visible
    /// once content exists.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        let visible = self
            .slots
            .iter()
            .filter(|s| s.state() == SlotState::Visible)
            .count();
        let hidden = self
            .slots
            .iter()
            .filter(|s| s.state() == SlotState::HiddenPending)
            .count();

        let visible_ok = if self.detached {
            visible == 0
        } else {
            visible <= 1 && (hidden == 0 || visible == 1)
        };
        visible_ok && hidden <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::data::slot::SlotState::{Empty, HiddenPending, Visible};

    fn states<C>(ring: &SlotRing<C>) -> [SlotState; SLOT_COUNT] {
        ring.status().states
    }

    #[test]
    fn first_content_goes_to_slot_zero() {
        let mut ring = SlotRing::new();

        let placement = ring.place(Arc::new("a"));

        assert_eq!(placement, Placement { shown: 0, hidden: None });
        assert_eq!(states(&ring), [Visible, Empty, Empty]);
        assert_eq!(ring.take_pending_switch(), Some(0));
        assert_eq!(ring.visible_content().as_deref(), Some(&"a"));
    }

    #[test]
    fn second_content_hides_first() {
        let mut ring = SlotRing::new();
        ring.place(Arc::new("a"));
        ring.take_pending_switch();

        let placement = ring.place(Arc::new("b"));

        assert_eq!(placement, Placement { shown: 1, hidden: Some(0) });
        assert_eq!(states(&ring), [HiddenPending, Visible, Empty]);
        assert!(!ring.can_accept());
        // Until the draw loop switches, it keeps presenting the old slot.
        assert_eq!(ring.visible_content().as_deref(), Some(&"a"));
        assert!(ring.invariants_hold());
    }

    #[test]
    fn ring_cycles_through_all_three_slots() {
        let mut ring = SlotRing::new();
        ring.place(Arc::new(0));
        ring.take_pending_switch();

        for (expected, value) in [(1, 1), (2, 2), (0, 3), (1, 4)] {
            let placement = ring.place(Arc::new(value));
            assert_eq!(placement.shown, expected);
            ring.take_pending_switch();
            let hidden = placement.hidden.expect("previous slot is hidden");
            assert!(ring.reclaim(hidden).is_some());
            assert!(ring.invariants_hold());
            assert_eq!(ring.visible_content().as_deref(), Some(&value));
        }
    }

    #[test]
    fn reclaim_leaves_visible_slots_alone() {
        let mut ring = SlotRing::new();
        ring.place(Arc::new("a"));

        assert!(ring.reclaim(0).is_none());
        assert_eq!(ring.state(0), Visible);
    }

    #[test]
    fn failures_keep_content_and_clear_feasible() {
        let mut ring = SlotRing::new();
        ring.place(Arc::new("a"));
        ring.take_pending_switch();

        ring.record_failure(BuildError::bad_mapping("no spatial mapping"));

        let status = ring.status();
        assert!(!status.feasible);
        assert_eq!(
            status.last_error,
            Some(BuildError::bad_mapping("no spatial mapping"))
        );
        assert_eq!(ring.visible_content().as_deref(), Some(&"a"));

        ring.place(Arc::new("b"));
        assert!(ring.status().feasible);
        assert_eq!(ring.status().last_error, None);
    }

    #[test]
    fn detach_releases_everything() {
        let mut ring = SlotRing::new();
        ring.place(Arc::new("a"));
        ring.take_pending_switch();
        ring.place(Arc::new("b"));

        let released = ring.detach();

        assert_eq!(released.len(), 2);
        assert_eq!(states(&ring), [Empty, Empty, Empty]);
        assert!(!ring.can_accept());
        assert!(ring.visible_content().is_none());
        assert!(ring.invariants_hold());
    }
}
