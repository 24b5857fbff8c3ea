use crate::controllers::rendering::data::swap_data::SwapData;
use crate::controllers::rendering::errors::render::RenderError;
use crate::controllers::rendering::events::render::RenderEvent;
use crate::controllers::rendering::ports::presenter::RenderPresenterPort;
use crate::core::actions::cancellation::CancelToken;
use crate::core::ports::content_builder::ContentBuilder;
use crate::core::swap::{SwapController, SwapError};
use crate::core::sync::lock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::debug;

struct SharedState<B: ContentBuilder> {
    generation: AtomicU64,
    last_completed_generation: AtomicU64,
    latest_request: Mutex<Option<(u64, Arc<B::Request>)>>,
    wake: Condvar,
    shutdown: AtomicBool,
    builder: Arc<B>,
    controller: SwapController<B::Content>,
    presenter_port: Arc<dyn RenderPresenterPort>,
}

/// Builds content for one rendering off the draw thread.
///
/// Only the newest request matters: a new request replaces any queued one
/// and cancels the build in flight at its next safe point.
pub struct RenderWorker<B: ContentBuilder> {
    shared: Arc<SharedState<B>>,
    worker: Option<JoinHandle<()>>,
}

impl<B: ContentBuilder> RenderWorker<B> {
    pub fn new(
        builder: Arc<B>,
        controller: SwapController<B::Content>,
        presenter_port: Arc<dyn RenderPresenterPort>,
    ) -> Self {
        let shared = Arc::new(SharedState {
            generation: AtomicU64::new(0),
            last_completed_generation: AtomicU64::new(0),
            latest_request: Mutex::new(None),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
            builder,
            controller,
            presenter_port,
        });

        let worker_shared = Arc::clone(&shared);

        let worker = thread::spawn(move || {
            Self::worker_loop(&worker_shared);
        });

        Self {
            shared,
            worker: Some(worker),
        }
    }

    pub fn request(&self, request: B::Request) -> u64 {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut guard = lock(&self.shared.latest_request);
            *guard = Some((generation, Arc::new(request)));
        }

        self.shared.wake.notify_one();
        // A superseded build may be parked in `submit`; let it see the change.
        self.shared.controller.wake_waiters();

        generation
    }

    /// Stops building without waiting for the thread to exit.
    pub fn cancel(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.wake.notify_one();
        self.shared.controller.wake_waiters();
    }

    pub fn shutdown(&mut self) {
        self.cancel();

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    #[must_use]
    pub fn last_completed_generation(&self) -> u64 {
        self.shared
            .last_completed_generation
            .load(Ordering::Acquire)
    }

    fn worker_loop(shared: &Arc<SharedState<B>>) {
        loop {
            let (job_generation, request) = {
                let mut guard = lock(&shared.latest_request);
                loop {
                    if shared.shutdown.load(Ordering::Acquire) {
                        return;
                    }

                    if let Some(req) = guard.take() {
                        break req;
                    }

                    guard = shared
                        .wake
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            let cancel_token = || {
                shared.shutdown.load(Ordering::Relaxed)
                    || job_generation != shared.generation.load(Ordering::Relaxed)
            };

            let start = Instant::now();
            let result = shared.builder.build(&request, &cancel_token);
            let build_duration = start.elapsed();

            match result {
                Ok(content) => {
                    if cancel_token.is_cancelled() {
                        continue;
                    }

                    match shared.controller.submit(content, &cancel_token) {
                        Ok(receipt) => {
                            shared.presenter_port.present(RenderEvent::Swapped(SwapData {
                                rendering: shared.controller.id(),
                                generation: job_generation,
                                slot: receipt.slot,
                                build_duration,
                                timed_out_waits: receipt.timed_out_waits,
                            }));

                            shared
                                .last_completed_generation
                                .fetch_max(job_generation, Ordering::AcqRel);
                        }
                        Err(SwapError::Cancelled(_)) => {
                            continue;
                        }
                        Err(SwapError::Detached(rendering)) => {
                            debug!(%rendering, "rendering detached, worker exiting");
                            return;
                        }
                    }
                }
                Err(error) if error.is_cancelled() => {
                    continue;
                }
                Err(error) => {
                    if cancel_token.is_cancelled() {
                        continue;
                    }

                    shared.controller.report_failure(error.clone());

                    shared
                        .presenter_port
                        .present(RenderEvent::Failed(RenderError {
                            rendering: shared.controller.id(),
                            generation: job_generation,
                            source: error,
                        }));

                    shared
                        .last_completed_generation
                        .fetch_max(job_generation, Ordering::AcqRel);
                }
            }
        }
    }
}

impl<B: ContentBuilder> Drop for RenderWorker<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
