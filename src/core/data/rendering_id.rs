use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RENDERING_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for one data reference's presence in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderingId(u64);

impl RenderingId {
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RENDERING_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
