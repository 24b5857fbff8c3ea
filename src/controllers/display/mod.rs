//! Draw-side driver: realizes switches, presents content, ticks removals.

pub mod config;
pub mod display;
pub mod draw_loop;
pub mod redraw_signal;

pub use config::DrawLoopConfig;
pub use display::{Display, FrameReport};
pub use draw_loop::DrawLoop;
pub use redraw_signal::RedrawSignal;
