use crate::core::control::switch_registry::ControlSwitchRegistry;
use crate::core::data::unit::ScalarValue;
use crate::core::ports::redraw::RedrawTrigger;
use crate::core::sync::lock;
use std::sync::{Arc, Mutex};

/// A scalar control set directly by the application (e.g. a shared time
/// value). Every change is forwarded to the registry it drives.
pub struct ValueControl {
    value: Mutex<ScalarValue>,
    registry: Arc<ControlSwitchRegistry>,
    redraw: Arc<dyn RedrawTrigger>,
}

impl std::fmt::Debug for ValueControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueControl")
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

impl ValueControl {
    #[must_use]
    pub fn new(registry: Arc<ControlSwitchRegistry>, redraw: Arc<dyn RedrawTrigger>) -> Self {
        Self {
            value: Mutex::new(ScalarValue::missing()),
            registry,
            redraw,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ControlSwitchRegistry> {
        &self.registry
    }

    /// Stores `value` and applies it to every bound switch.
    ///
    /// A missing value is stored but leaves the switches as they were.
    /// Returns the number of switches updated.
    pub fn set_value(&self, value: ScalarValue) -> usize {
        let mut current = lock(&self.value);
        let applied = self.registry.apply(&value);
        *current = value;
        drop(current);

        if applied > 0 {
            self.redraw.request_redraw();
        }
        applied
    }

    #[must_use]
    pub fn value(&self) -> ScalarValue {
        lock(&self.value).clone()
    }
}
