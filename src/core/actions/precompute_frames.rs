use rayon::prelude::*;

use crate::core::actions::cancellation::{CancelToken, Cancelled};
use crate::core::animation::frame_switch::FrameSwitch;
use crate::core::ports::content_builder::{BuildError, ContentBuilder};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameSetError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("frame {index} failed to build: {source}")]
    Build { index: usize, source: BuildError },
}

/// Builds every animation frame in parallel, preserving request order.
///
/// Each frame checks `cancel` before it starts and hands it to the builder
/// for finer-grained checks. The whole set fails on cancellation or on any
/// frame's build error; no partial set is returned.
#[tracing::instrument(level = "debug", skip_all, fields(frames = requests.len()))]
pub fn precompute_frames<B>(
    builder: &B,
    requests: &[B::Request],
    cancel: &dyn CancelToken,
) -> Result<Vec<B::Content>, FrameSetError>
where
    B: ContentBuilder,
{
    requests
        .par_iter()
        .enumerate()
        .map(|(index, request)| {
            cancel.check()?;
            builder.build(request, cancel).map_err(|error| match error {
                BuildError::Cancelled(cancelled) => FrameSetError::Cancelled(cancelled),
                source => FrameSetError::Build { index, source },
            })
        })
        .collect()
}

/// [`precompute_frames`] straight into a [`FrameSwitch`].
pub fn precompute_frame_switch<B>(
    builder: &B,
    requests: &[B::Request],
    cancel: &dyn CancelToken,
) -> Result<FrameSwitch<B::Content>, FrameSetError>
where
    B: ContentBuilder,
{
    precompute_frames(builder, requests, cancel).map(FrameSwitch::new)
}
