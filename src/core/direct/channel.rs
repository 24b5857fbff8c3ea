use crate::core::ports::redraw::RedrawTrigger;
use crate::core::sync::lock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectError {
    #[error("direct manipulation unavailable: {0}")]
    Unavailable(String),
    #[error("a drag is already in progress")]
    DragInProgress,
    #[error("no drag in progress")]
    NoDrag,
}

struct DirectState<C> {
    content: C,
    why_not: Option<String>,
    dragging: bool,
}

/// Single-copy content mutated in place for interactive feedback.
///
/// Bypasses the slot ring entirely: there is nothing to swap, so the draw
/// loop reads the same value the manipulator writes. Reads and writes share
/// one lock, so a frame never sees a half-applied edit.
pub struct DirectChannel<C> {
    state: Mutex<DirectState<C>>,
    generation: AtomicU64,
    redraw: Arc<dyn RedrawTrigger>,
}

impl<C> std::fmt::Debug for DirectChannel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectChannel")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl<C> DirectChannel<C> {
    #[must_use]
    pub fn new(content: C, redraw: Arc<dyn RedrawTrigger>) -> Self {
        Self {
            state: Mutex::new(DirectState {
                content,
                why_not: None,
                dragging: false,
            }),
            generation: AtomicU64::new(0),
            redraw,
        }
    }

    /// Why manipulation is refused, or `None` when it is allowed.
    #[must_use]
    pub fn why_not_direct(&self) -> Option<String> {
        lock(&self.state).why_not.clone()
    }

    #[must_use]
    pub fn is_direct(&self) -> bool {
        lock(&self.state).why_not.is_none()
    }

    /// Refuses further manipulation. An active drag is abandoned.
    pub fn disable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%reason, "direct manipulation disabled");
        let mut state = lock(&self.state);
        state.why_not = Some(reason);
        state.dragging = false;
    }

    pub fn enable(&self) {
        lock(&self.state).why_not = None;
    }

    pub fn begin_drag(&self) -> Result<(), DirectError> {
        let mut state = lock(&self.state);
        if let Some(reason) = &state.why_not {
            return Err(DirectError::Unavailable(reason.clone()));
        }
        if state.dragging {
            return Err(DirectError::DragInProgress);
        }
        state.dragging = true;
        Ok(())
    }

    /// Ends the drag and returns the generation it left behind.
    pub fn end_drag(&self) -> Result<u64, DirectError> {
        let mut state = lock(&self.state);
        if !state.dragging {
            return Err(DirectError::NoDrag);
        }
        state.dragging = false;
        Ok(self.generation())
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        lock(&self.state).dragging
    }

    /// Applies `edit` to the live content and asks for a redraw.
    pub fn manipulate<R>(&self, edit: impl FnOnce(&mut C) -> R) -> Result<R, DirectError> {
        let result = {
            let mut state = lock(&self.state);
            if let Some(reason) = &state.why_not {
                return Err(DirectError::Unavailable(reason.clone()));
            }
            let result = edit(&mut state.content);
            self.generation.fetch_add(1, Ordering::AcqRel);
            result
        };
        self.redraw.request_redraw();
        Ok(result)
    }

    /// Draw-side read. `f` also gets the generation of what it sees.
    pub fn read<R>(&self, f: impl FnOnce(&C, u64) -> R) -> R {
        let state = lock(&self.state);
        f(&state.content, self.generation())
    }

    /// Number of edits applied so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
