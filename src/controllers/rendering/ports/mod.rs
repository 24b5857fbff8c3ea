//! Port definitions for the rendering controller.
//!
//! Outcomes of background builds leave through [`RenderPresenterPort`];
//! presenters decide how to surface them.

pub mod presenter;

pub use presenter::RenderPresenterPort;
