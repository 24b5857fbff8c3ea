//! Port definitions for the swap engine.
//!
//! Traits the engine calls out through: scene backends implement
//! [`SwitchTarget`], data layers implement [`ContentBuilder`], and display
//! loops implement [`RedrawTrigger`].

pub mod content_builder;
pub mod redraw;
pub mod switch_target;

pub use content_builder::{BuildError, ContentBuilder};
pub use redraw::{NoRedraw, RedrawTrigger};
pub use switch_target::SwitchTarget;
