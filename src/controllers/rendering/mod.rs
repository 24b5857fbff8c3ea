//! Application layer for live renderings.
//!
//! Follows the ports & adapters pattern:
//! - **Input**: requests handed to [`Rendering::request`]
//! - **Output**: [`RenderPresenterPort`] receives swap and failure events
//! - **Core**: builds run through a [`ContentBuilder`](crate::core::ports::ContentBuilder)
//!   and land in the rendering's slot ring

pub mod data;
pub mod errors;
pub mod events;
pub mod ports;
mod rendering;
mod worker;

pub use data::swap_data::SwapData;
pub use errors::render::RenderError;
pub use events::render::RenderEvent;
pub use ports::RenderPresenterPort;
pub use rendering::Rendering;
pub use worker::RenderWorker;
