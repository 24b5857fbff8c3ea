use crate::core::ports::switch_target::SwitchTarget;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const NO_CHILD: usize = usize::MAX;

/// In-memory switch node: records which child is visible.
///
/// Backends that keep their own scene graph wrap this or implement
/// [`SwitchTarget`] directly.
#[derive(Debug)]
pub struct IndexSwitch {
    children: usize,
    visible: AtomicUsize,
    switches: AtomicU64,
}

impl IndexSwitch {
    #[must_use]
    pub fn new(children: usize) -> Self {
        Self {
            children,
            visible: AtomicUsize::new(NO_CHILD),
            switches: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn visible_child(&self) -> Option<usize> {
        match self.visible.load(Ordering::Acquire) {
            NO_CHILD => None,
            index => Some(index),
        }
    }

    /// Number of accepted `set_visible_child` calls.
    #[must_use]
    pub fn switch_count(&self) -> u64 {
        self.switches.load(Ordering::Acquire)
    }
}

impl SwitchTarget for IndexSwitch {
    fn child_count(&self) -> usize {
        self.children
    }

    fn set_visible_child(&self, index: usize) {
        if index < self.children {
            self.visible.store(index, Ordering::Release);
            self.switches.fetch_add(1, Ordering::AcqRel);
        }
    }
}
