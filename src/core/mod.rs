pub mod actions;
pub mod animation;
pub mod control;
pub mod data;
pub mod direct;
pub mod ports;
pub mod swap;
pub(crate) mod sync;
