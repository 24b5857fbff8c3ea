use std::sync::Arc;

/// Number of buffers in every rendering's content ring.
pub const SLOT_COUNT: usize = 3;

/// Frames a hidden slot must survive before its content may be cleared.
pub const REMOVAL_DELAY_FRAMES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Visible,
    HiddenPending,
}

/// One buffer of a rendering's ring.
///
/// Content is shared with the draw loop through `Arc`, so clearing a slot
/// never frees geometry a frame in progress still holds.
#[derive(Debug)]
pub struct Slot<C> {
    content: Option<Arc<C>>,
    state: SlotState,
    pending_frames: u32,
}

impl<C> Default for Slot<C> {
    fn default() -> Self {
        Self {
            content: None,
            state: SlotState::Empty,
            pending_frames: 0,
        }
    }
}

impl<C> Slot<C> {
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[must_use]
    pub fn pending_frames(&self) -> u32 {
        self.pending_frames
    }

    #[must_use]
    pub fn content(&self) -> Option<&Arc<C>> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state == SlotState::Empty
    }

    pub(crate) fn show(&mut self, content: Arc<C>) {
        debug_assert!(
            self.state == SlotState::Empty,
            "only an empty slot may receive new content"
        );
        self.content = Some(content);
        self.state = SlotState::Visible;
        self.pending_frames = 0;
    }

    pub(crate) fn hide(&mut self) {
        debug_assert!(
            self.state == SlotState::Visible,
            "only the visible slot can be hidden"
        );
        self.state = SlotState::HiddenPending;
        self.pending_frames = REMOVAL_DELAY_FRAMES;
    }

    /// Empties a hidden slot. Returns the released content, if any.
    pub(crate) fn clear(&mut self) -> Option<Arc<C>> {
        self.state = SlotState::Empty;
        self.pending_frames = 0;
        self.content.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_is_empty() {
        let slot: Slot<u8> = Slot::default();

        assert!(slot.is_empty());
        assert!(slot.content().is_none());
        assert_eq!(slot.pending_frames(), 0);
    }

    #[test]
    fn slot_walks_visible_hidden_empty() {
        let mut slot = Slot::default();

        slot.show(Arc::new("a"));
        assert_eq!(slot.state(), SlotState::Visible);

        slot.hide();
        assert_eq!(slot.state(), SlotState::HiddenPending);
        assert_eq!(slot.pending_frames(), REMOVAL_DELAY_FRAMES);
        assert!(slot.content().is_some(), "hidden content stays until cleared");

        let released = slot.clear();
        assert_eq!(released.as_deref(), Some(&"a"));
        assert!(slot.is_empty());
    }
}
