use crate::core::animation::config::{AnimationConfig, DEFAULT_STEP};
use crate::core::animation::errors::AnimationError;
use crate::core::animation::state::{AnimationState, Direction, SaveRecord};
use crate::core::control::switch_registry::ControlSwitchRegistry;
use crate::core::data::domain_set::DomainSet;
use crate::core::data::unit::ScalarValue;
use crate::core::ports::redraw::RedrawTrigger;
use crate::core::sync::lock;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

struct SequencerState {
    on: bool,
    direction: Direction,
    current: usize,
    steps: Vec<Duration>,
    compute_set: bool,
    set: Option<Arc<dyn DomainSet>>,
    /// Last single-step dwell; fills the table whenever it is rebuilt.
    step: Duration,
    deadline: Option<Instant>,
    shutdown: bool,
}

impl SequencerState {
    fn frame_count(&self) -> usize {
        self.set.as_ref().map_or(0, |set| set.len())
    }

    /// Past the end wraps to 0, before the start wraps to the last frame.
    fn clip(&self, index: i64) -> usize {
        let len = self.frame_count();
        if len == 0 {
            return 0;
        }
        match usize::try_from(index) {
            Ok(index) if index < len => index,
            Ok(_) => 0,
            Err(_) => len - 1,
        }
    }

    fn dwell(&self) -> Duration {
        self.steps.get(self.current).copied().unwrap_or(DEFAULT_STEP)
    }

    fn advance(&mut self) {
        let delta = if self.direction.is_forward() { 1 } else { -1 };
        let current = i64::try_from(self.current).unwrap_or(i64::MAX);
        self.current = self.clip(current.saturating_add(delta));
    }

    fn table_len(&self, requested: usize) -> usize {
        match self.frame_count() {
            0 => requested,
            len => len,
        }
    }

    fn snapshot(&self) -> AnimationState {
        AnimationState {
            on: self.on,
            direction: self.direction,
            current: self.current,
            steps: self.steps.clone(),
            compute_set: self.compute_set,
        }
    }
}

/// Pads `requested` with its last entry (or truncates it) to `len` frames.
fn fill_table(requested: &[Duration], len: usize) -> Vec<Duration> {
    let last = requested.last().copied().unwrap_or(DEFAULT_STEP);
    (0..len)
        .map(|i| requested.get(i).copied().unwrap_or(last))
        .collect()
}

fn positive_ms(ms: i64) -> Option<Duration> {
    u64::try_from(ms)
        .ok()
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}

struct Shared {
    state: Mutex<SequencerState>,
    rearm: Condvar,
    registry: Arc<ControlSwitchRegistry>,
    redraw: Arc<dyn RedrawTrigger>,
}

impl Shared {
    /// Pushes the current frame to every bound switch and rearms the timer.
    ///
    /// Runs inside the state lock so timer steps and user seeks are applied
    /// to the switches in the same order they changed `current`.
    fn publish(&self, state: &mut SequencerState) {
        if let Some(set) = &state.set {
            if let Some(value) = set.value(state.current) {
                let value = ScalarValue {
                    value,
                    unit: set.unit().cloned(),
                };
                self.registry.apply(&value);
            }
        }
        self.rearm_locked(state);
        self.redraw.request_redraw();
    }

    fn rearm_locked(&self, state: &mut SequencerState) {
        state.deadline = None;
        self.rearm.notify_all();
    }
}

/// Steps an index over a domain set, by hand or on a dwell timer, and
/// drives every switch bound to its control.
///
/// All state sits behind one mutex shared with the timer thread, so
/// automatic steps never interleave with seeks.
pub struct AnimationSequencer {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for AnimationSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationSequencer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl AnimationSequencer {
    #[must_use]
    pub fn new(
        registry: Arc<ControlSwitchRegistry>,
        redraw: Arc<dyn RedrawTrigger>,
        config: AnimationConfig,
    ) -> Self {
        let step = if config.default_step.is_zero() {
            DEFAULT_STEP
        } else {
            config.default_step
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(SequencerState {
                on: config.on,
                direction: config.direction,
                current: 0,
                steps: vec![step],
                compute_set: config.compute_set,
                set: None,
                step,
                deadline: None,
                shutdown: false,
            }),
            rearm: Condvar::new(),
            registry,
            redraw,
        });

        let timer_shared = Arc::clone(&shared);
        let timer = thread::spawn(move || {
            Self::timer_loop(&timer_shared);
        });

        Self {
            shared,
            timer: Some(timer),
        }
    }

    fn timer_loop(shared: &Shared) {
        let mut state = lock(&shared.state);
        loop {
            if state.shutdown {
                return;
            }
            if !state.on {
                state.deadline = None;
                state = shared
                    .rearm
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            let now = Instant::now();
            let dwell = state.dwell();
            let deadline = *state.deadline.get_or_insert(now + dwell);

            if now >= deadline {
                state.advance();
                debug!(current = state.current, "animation timer step");
                shared.publish(&mut state);
                let dwell = state.dwell();
                state.deadline = Some(Instant::now() + dwell);
                continue;
            }

            state = shared
                .rearm
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, SequencerState> {
        lock(&self.shared.state)
    }

    /// Advances one frame in the current direction, wrapping at either end.
    pub fn step(&self) -> usize {
        let mut state = self.state_guard();
        state.advance();
        debug!(current = state.current, "animation step");
        self.shared.publish(&mut state);
        state.current
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.state_guard().current
    }

    /// Seeks to `index`. Out-of-range indices wrap; with no set the index is 0.
    pub fn set_current(&self, index: i64) -> usize {
        let mut state = self.state_guard();
        state.current = state.clip(index);
        self.shared.publish(&mut state);
        state.current
    }

    /// Seeks to the frame whose sample is nearest to `value`.
    ///
    /// Missing values and an absent set leave the index where it is.
    pub fn set_current_value(&self, value: f64) -> usize {
        let mut state = self.state_guard();
        let nearest = state.set.as_ref().and_then(|set| set.nearest_index(value));
        if let Some(index) = nearest {
            state.current = index;
            self.shared.publish(&mut state);
        }
        state.current
    }

    pub fn set_on(&self, on: bool) {
        let mut state = self.state_guard();
        if state.on != on {
            info!(on, "animation {}", if on { "started" } else { "stopped" });
        }
        state.on = on;
        self.shared.rearm_locked(&mut state);
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state_guard().on
    }

    pub fn toggle(&self) -> bool {
        let mut state = self.state_guard();
        state.on = !state.on;
        info!(on = state.on, "animation toggled");
        self.shared.rearm_locked(&mut state);
        state.on
    }

    pub fn set_direction(&self, direction: Direction) {
        let mut state = self.state_guard();
        state.direction = direction;
        self.shared.rearm_locked(&mut state);
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.state_guard().direction
    }

    #[must_use]
    pub fn set(&self) -> Option<Arc<dyn DomainSet>> {
        self.state_guard().set.clone()
    }

    /// Replaces the animated domain set.
    ///
    /// A set equal to the current one changes nothing and returns `false`.
    /// A length change rebuilds the dwell table from the last single-step
    /// dwell. Clearing the set resets the index to 0; otherwise the index is
    /// clamped into the new range.
    pub fn set_set(&self, set: Option<Arc<dyn DomainSet>>) -> bool {
        let mut state = self.state_guard();

        let unchanged = match (&state.set, &set) {
            (None, None) => true,
            (Some(old), Some(new)) => Arc::ptr_eq(old, new) || old.same_domain(new.as_ref()),
            _ => false,
        };
        if unchanged {
            return false;
        }

        match &set {
            None => {
                state.steps = vec![state.step];
                state.current = 0;
            }
            Some(new) => {
                if new.len() != state.steps.len() {
                    state.steps = vec![state.step; new.len()];
                }
                state.current = state.current.min(new.len().saturating_sub(1));
            }
        }
        debug!(
            frames = set.as_ref().map_or(0, |s| s.len()),
            current = state.current,
            "animation set replaced"
        );
        state.set = set;
        self.shared.publish(&mut state);
        true
    }

    /// Replaces the set only while the compute-set flag is on.
    pub fn offer_set(&self, set: Option<Arc<dyn DomainSet>>) -> bool {
        if !self.compute_set() {
            return false;
        }
        self.set_set(set)
    }

    pub fn set_compute_set(&self, compute_set: bool) {
        self.state_guard().compute_set = compute_set;
    }

    #[must_use]
    pub fn compute_set(&self) -> bool {
        self.state_guard().compute_set
    }

    /// Sets the same dwell for every frame.
    pub fn set_step(&self, ms: i64) -> Result<(), AnimationError> {
        let step = positive_ms(ms).ok_or(AnimationError::NonPositiveStep(ms))?;
        let mut state = self.state_guard();
        state.step = step;
        state.steps.iter_mut().for_each(|s| *s = step);
        self.shared.rearm_locked(&mut state);
        Ok(())
    }

    /// Sets per-frame dwells in milliseconds.
    ///
    /// Shorter lists are padded with their last entry and longer ones are
    /// truncated to the frame count. Every entry is validated before any
    /// state changes.
    pub fn set_steps(&self, steps: &[i64]) -> Result<(), AnimationError> {
        if steps.is_empty() {
            return Err(AnimationError::EmptySteps);
        }
        let requested = steps
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                positive_ms(value).ok_or(AnimationError::NonPositiveStepAt { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state_guard();
        let len = state.table_len(requested.len());
        state.steps = fill_table(&requested, len);
        self.shared.rearm_locked(&mut state);
        Ok(())
    }

    #[must_use]
    pub fn steps(&self) -> Vec<Duration> {
        self.state_guard().steps.clone()
    }

    /// Dwell of the current frame, or the default step if it has none.
    #[must_use]
    pub fn get_step(&self) -> Duration {
        self.state_guard().dwell()
    }

    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state_guard().snapshot()
    }

    #[must_use]
    pub fn save_string(&self) -> String {
        self.state().to_string()
    }

    /// Restores a save string. Nothing changes unless the whole string is valid.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_save_string(&self, save: &str) -> Result<(), AnimationError> {
        let record = SaveRecord::parse(save)?;

        let mut state = self.state_guard();
        state.on = record.on;
        state.direction = record.direction;
        let len = state.table_len(record.steps.len());
        state.steps = fill_table(&record.steps, len);
        state.current = state.clip(i64::try_from(record.current).unwrap_or(i64::MAX));
        if let Some(compute_set) = record.compute_set {
            state.compute_set = compute_set;
        }
        info!(on = state.on, current = state.current, "animation state restored");
        self.shared.publish(&mut state);
        Ok(())
    }

    /// Stops the timer thread. Further calls are no-ops.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.state_guard();
            state.shutdown = true;
            state.on = false;
        }
        self.shared.rearm.notify_all();

        if let Some(handle) = self.timer.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AnimationSequencer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
