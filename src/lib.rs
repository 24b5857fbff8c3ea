//! Tear-free scene content swapping for live displays.
//!
//! Workers rebuild a rendering's content in the background while a draw
//! loop keeps presenting the previous version; a three-slot ring per
//! rendering and frame-delayed removal make the hand-off safe. Animation
//! switches among precomputed frames instead of rebuilding.

pub mod controllers;
pub mod core;
pub mod presenters;

pub use controllers::display::{Display, DrawLoop, DrawLoopConfig, FrameReport, RedrawSignal};
pub use controllers::rendering::{
    RenderError, RenderEvent, RenderPresenterPort, RenderWorker, Rendering, SwapData,
};
pub use core::actions::cancellation::{CancelFlag, CancelToken, Cancelled, NeverCancel};
pub use core::actions::precompute_frames::{FrameSetError, precompute_frame_switch, precompute_frames};
pub use core::animation::{
    AnimationConfig, AnimationError, AnimationSequencer, AnimationState, Direction, FrameSwitch,
};
pub use core::control::{ControlBinding, ControlSwitchRegistry, ValueControl};
pub use core::data::{
    DomainSet, DomainSetCache, DomainSetError, Gridded1DSet, IndexSwitch, InternTable, Linear1DSet, MISSING,
    RenderingId, ScalarValue, SlotState, Unit, UnitError, is_missing,
};
pub use core::direct::{DirectChannel, DirectError};
pub use core::ports::{BuildError, ContentBuilder, NoRedraw, RedrawTrigger, SwitchTarget};
pub use core::swap::{
    DeferredRemovalScheduler, SubmitReceipt, SwapConfig, SwapController, SwapError, SwapStatus,
};
pub use presenters::overlay::OverlayPresenter;
