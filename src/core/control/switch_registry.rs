use crate::core::data::domain_set::DomainSet;
use crate::core::data::rendering_id::RenderingId;
use crate::core::data::unit::ScalarValue;
use crate::core::ports::switch_target::SwitchTarget;
use crate::core::sync::lock;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One switch that follows a control, sampled over `set`.
pub struct ControlBinding {
    pub target: Arc<dyn SwitchTarget>,
    pub set: Arc<dyn DomainSet>,
    pub owner: RenderingId,
}

impl std::fmt::Debug for ControlBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBinding")
            .field("owner", &self.owner)
            .field("set_len", &self.set.len())
            .field("children", &self.target.child_count())
            .finish()
    }
}

/// Maps a control's value to the visible child of every bound switch.
///
/// Bindings are applied under the registry lock, so once
/// [`unregister_all`](Self::unregister_all) returns no switch of that
/// rendering is touched again.
#[derive(Debug, Default)]
pub struct ControlSwitchRegistry {
    bindings: Mutex<Vec<ControlBinding>>,
}

impl ControlSwitchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        target: Arc<dyn SwitchTarget>,
        set: Arc<dyn DomainSet>,
        owner: RenderingId,
    ) {
        debug!(%owner, samples = set.len(), "control binding registered");
        lock(&self.bindings).push(ControlBinding { target, set, owner });
    }

    /// Removes every binding owned by `owner`. Returns how many went away.
    pub fn unregister_all(&self, owner: RenderingId) -> usize {
        let mut bindings = lock(&self.bindings);
        let before = bindings.len();
        bindings.retain(|b| b.owner != owner);
        let removed = before - bindings.len();
        if removed > 0 {
            debug!(%owner, removed, "control bindings removed");
        }
        removed
    }

    /// Shows, on every bound switch, the child nearest to `value`.
    ///
    /// Missing values leave every switch as it is. Bindings whose set unit
    /// cannot represent `value`, or whose nearest index has no child, are
    /// skipped. Returns the number of switches updated.
    pub fn apply(&self, value: &ScalarValue) -> usize {
        if value.is_missing() {
            return 0;
        }

        let bindings = lock(&self.bindings);
        let mut applied = 0;

        for binding in bindings.iter() {
            let coordinate = match value.in_unit(binding.set.unit()) {
                Ok(coordinate) => coordinate,
                Err(error) => {
                    warn!(owner = %binding.owner, %error, "control value not applicable to binding");
                    continue;
                }
            };
            let Some(index) = binding.set.nearest_index(coordinate) else {
                continue;
            };
            if index >= binding.target.child_count() {
                warn!(
                    owner = %binding.owner,
                    index,
                    children = binding.target.child_count(),
                    "nearest sample has no matching child"
                );
                continue;
            }
            binding.target.set_visible_child(index);
            applied += 1;
        }

        applied
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.bindings).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.bindings).is_empty()
    }

    #[must_use]
    pub fn bound_owners(&self) -> Vec<RenderingId> {
        let mut owners: Vec<RenderingId> = lock(&self.bindings).iter().map(|b| b.owner).collect();
        owners.sort();
        owners.dedup();
        owners
    }
}
