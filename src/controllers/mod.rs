pub mod display;
pub mod rendering;
