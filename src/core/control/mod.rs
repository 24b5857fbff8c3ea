//! Control-to-visibility bindings shared across renderings.

pub mod switch_registry;
pub mod value_control;

pub use switch_registry::{ControlBinding, ControlSwitchRegistry};
pub use value_control::ValueControl;
