pub mod cancellation;
pub mod precompute_frames;
