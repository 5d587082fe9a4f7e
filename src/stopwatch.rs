use crate::clock::MonotonicClock;
use crate::phase::Phase;
use crate::poller::{Observation, Poller, Subscription, DEFAULT_POLL_INTERVAL};
use crate::snapshot::Snapshot;
use crate::timer::Timer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Everything guarded by a stopwatch's lock.
pub(crate) struct Shared {
    clock: MonotonicClock,
    timer: Timer,
    observation: Option<Observation>,
    poller: Option<Poller>,
    /// Bumped whenever a poller is armed or cancelled; a poller only publishes for its own generation.
    generation: u64,
}

impl Shared {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.timer.snapshot(self.clock.now())
    }

    fn publish(&self, now: Instant) {
        if let Some(observation) = &self.observation {
            observation.publish(self.timer.snapshot(now));
        }
    }

    fn cancel_poller(&mut self) {
        self.generation += 1;
        self.poller = None;
    }
}

/// The lock only guards plain data and every operation leaves it consistent, so a poisoned lock
/// is still usable.
pub(crate) fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A programmatic stopwatch that can be shared between tasks.
///
/// ## Features include:
/// - Stopping the recording of elapsed time
/// - Resuming a stopwatch that has been stopped
/// - Recording laps
/// - Polling the stopwatch at a custom interval for up to date snapshots
///
/// Operations are serialized through a single lock and take effect in the order they acquire it.
/// Invalid operations, such as a lap on a stopped stopwatch, are ignored.
pub struct Stopwatch {
    shared: Arc<Mutex<Shared>>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        let shared = Shared {
            clock: MonotonicClock,
            timer: Timer::new(),
            observation: None,
            poller: None,
            generation: 0,
        };

        Self {
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }

    /// Starts measuring time, or resumes a stopped stopwatch.
    ///
    /// Starting a running stopwatch does nothing.
    pub fn start(&self) {
        let mut guard = self.lock();
        self.run_locked(&mut guard, Timer::start);
    }

    /// Resumes a stopwatch that has been stopped. Does nothing in any other phase.
    pub fn resume(&self) {
        let mut guard = self.lock();
        self.run_locked(&mut guard, Timer::resume);
    }

    /// Applies a starting operation and, when it set the timer running, arms a new poller.
    fn run_locked(&self, shared: &mut Shared, operation: fn(&mut Timer, Instant)) {
        let before = shared.timer.phase();
        let now = shared.clock.now();
        operation(&mut shared.timer, now);

        if before == Phase::Running || shared.timer.phase() != Phase::Running {
            tracing::trace!(phase = %before, "Stopwatch did not start");
            return;
        }

        self.arm(shared);
        shared.publish(now);

        tracing::debug!(total = shared.timer.total_elapsed(now), "Started stopwatch");
    }

    /// Stops the stopwatch. Time passing while stopped is not counted.
    ///
    /// The polling task is cancelled before this returns; no snapshot taken while running is
    /// published afterwards.
    pub fn stop(&self) {
        let mut guard = self.lock();
        let shared = &mut *guard;

        if shared.timer.phase() != Phase::Running {
            tracing::trace!(phase = %shared.timer.phase(), "Stopwatch is not running");
            return;
        }

        let now = shared.clock.now();
        shared.timer.stop(now);
        shared.cancel_poller();
        shared.publish(now);

        tracing::debug!(total = shared.timer.total_elapsed(now), "Stopped stopwatch");
    }

    /// Records a lap. Only a running stopwatch records laps.
    pub fn lap(&self) {
        let mut guard = self.lock();
        let shared = &mut *guard;

        if shared.timer.phase() != Phase::Running {
            tracing::trace!(phase = %shared.timer.phase(), "Laps require a running stopwatch");
            return;
        }

        let now = shared.clock.now();
        shared.timer.lap(now);
        shared.publish(now);

        tracing::debug!(laps = shared.timer.laps(now).len(), "Recorded lap");
    }

    /// Resets the stopwatch to its initial values.
    ///
    /// An active poller keeps running and publishes zeroed snapshots until the stopwatch starts again.
    pub fn reset(&self) {
        let mut guard = self.lock();
        let shared = &mut *guard;

        let now = shared.clock.now();
        shared.timer.reset();
        shared.publish(now);

        tracing::debug!("Reset stopwatch");
    }

    pub fn phase(&self) -> Phase {
        self.lock().timer.phase()
    }

    /// The total time elapsed in seconds since the stopwatch started, excluding time spent stopped.
    pub fn total_time_elapsed_in_seconds(&self) -> f64 {
        let shared = self.lock();
        shared.timer.total_elapsed(shared.clock.now())
    }

    /// Seconds recorded by each finished lap, oldest first.
    pub fn laps(&self) -> Vec<f64> {
        let shared = self.lock();
        shared.timer.laps(shared.clock.now())
    }

    pub fn current_lap_elapsed_in_seconds(&self) -> f64 {
        let shared = self.lock();
        shared.timer.current_lap_elapsed(shared.clock.now())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Polls the stopwatch every [`DEFAULT_POLL_INTERVAL`].
    pub fn poll(&self) -> Subscription {
        self.poll_every(DEFAULT_POLL_INTERVAL)
    }

    /// Polls the stopwatch for up to date snapshots.
    ///
    /// The polling task is cancelled when the stopwatch stops and recreated when it starts again,
    /// publishing to the same subscription. A new call replaces the previous subscription, which
    /// then finishes. Must be called within a Tokio runtime for periodic snapshots.
    pub fn poll_every(&self, interval: Duration) -> Subscription {
        let mut guard = self.lock();
        let shared = &mut *guard;

        let (observation, subscription) = Observation::open(shared.snapshot(), interval);
        shared.observation = Some(observation);

        if shared.timer.phase() == Phase::Running || shared.poller.is_some() {
            self.arm(shared);
        }

        tracing::debug!(?interval, "Subscribed to stopwatch");

        subscription
    }

    /// Replaces any poller with one bound to the current observation.
    fn arm(&self, shared: &mut Shared) {
        shared.cancel_poller();

        if shared.observation.as_ref().is_some_and(Observation::is_closed) {
            tracing::trace!("Dropping closed subscription");
            shared.observation = None;
        }

        if let Some(observation) = &shared.observation {
            shared.poller = Poller::spawn(Arc::downgrade(&self.shared), observation, shared.generation);
        }
    }
}
