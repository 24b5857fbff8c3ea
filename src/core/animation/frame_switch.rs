use crate::core::ports::switch_target::SwitchTarget;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const NO_FRAME: usize = usize::MAX;

/// A switch over precomputed, immutable animation frames.
///
/// Frames are never rebuilt while attached; stepping only moves which one
/// the draw loop presents.
#[derive(Debug)]
pub struct FrameSwitch<C> {
    frames: Vec<Arc<C>>,
    visible: AtomicUsize,
}

impl<C> FrameSwitch<C> {
    #[must_use]
    pub fn new(frames: Vec<C>) -> Self {
        Self::from_shared(frames.into_iter().map(Arc::new).collect())
    }

    #[must_use]
    pub fn from_shared(frames: Vec<Arc<C>>) -> Self {
        Self {
            frames,
            visible: AtomicUsize::new(NO_FRAME),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&Arc<C>> {
        self.frames.get(index)
    }

    #[must_use]
    pub fn visible_index(&self) -> Option<usize> {
        match self.visible.load(Ordering::Acquire) {
            NO_FRAME => None,
            index => Some(index),
        }
    }

    #[must_use]
    pub fn visible_frame(&self) -> Option<Arc<C>> {
        self.visible_index()
            .and_then(|index| self.frames.get(index))
            .cloned()
    }
}

impl<C: Send + Sync> SwitchTarget for FrameSwitch<C> {
    fn child_count(&self) -> usize {
        self.frames.len()
    }

    fn set_visible_child(&self, index: usize) {
        if index < self.frames.len() {
            self.visible.store(index, Ordering::Release);
        }
    }
}
