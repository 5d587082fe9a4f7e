use crate::clock::MonotonicClock;
use crate::phase::Phase;
use crate::snapshot::Snapshot;
use std::time::Duration;
use tokio::time::Instant;

/// Elapsed-time state machine that computes the time elapsed lazily.
///
/// Every operation takes the instant it happens at, so a single reading of the clock is shared by
/// a timer and its laps. Laps are timers themselves: a root timer always holds its current lap at
/// the tail of `laps`, while a lap never holds laps of its own.
#[derive(Debug, Clone)]
pub struct Timer {
    clock: MonotonicClock,
    /// Start of the current running segment.
    start: Option<Instant>,
    /// End of the last running segment, unset while running.
    stop: Option<Instant>,
    /// Time banked from running segments before the current one.
    paused: Duration,
    phase: Phase,
    laps: Vec<Timer>,
    is_lap: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            laps: vec![Self::new_lap()],
            ..Self::blank(false)
        }
    }

    fn new_lap() -> Self {
        Self::blank(true)
    }

    fn blank(is_lap: bool) -> Self {
        Self {
            clock: MonotonicClock,
            start: None,
            stop: None,
            paused: Duration::ZERO,
            phase: Phase::Initialized,
            laps: Vec::new(),
            is_lap,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_lap(&self) -> bool {
        self.is_lap
    }

    /// Starts measuring, or resumes when stopped. Starting a running timer does nothing.
    pub fn start(&mut self, now: Instant) {
        if self.phase == Phase::Running {
            return;
        }

        if self.phase == Phase::Stopped {
            self.paused += self.segment(now);
        }

        self.start = Some(now);
        self.stop = None;
        self.phase = Phase::Running;

        if let Some(lap) = self.laps.last_mut() {
            lap.start(now);
        }
    }

    /// Resumes a stopped timer. Unlike [`Timer::start`] this does nothing from `Initialized`.
    pub fn resume(&mut self, now: Instant) {
        if self.phase == Phase::Stopped {
            self.start(now);
        }
    }

    pub fn stop(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }

        self.stop = Some(now);
        self.phase = Phase::Stopped;

        if let Some(lap) = self.laps.last_mut() {
            lap.stop(now);
        }
    }

    /// Closes the current lap and opens the next one at `now`.
    ///
    /// Only a running root timer records laps.
    pub fn lap(&mut self, now: Instant) {
        if self.is_lap || self.phase != Phase::Running {
            return;
        }

        if let Some(current) = self.laps.last_mut() {
            current.stop(now);
        }

        let mut next = Self::new_lap();
        next.start(now);
        self.laps.push(next);
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.stop = None;
        self.paused = Duration::ZERO;
        self.phase = Phase::Initialized;

        if !self.is_lap {
            self.laps = vec![Self::new_lap()];
        }
    }

    pub fn total_duration(&self, now: Instant) -> Duration {
        self.segment(now) + self.paused
    }

    /// Total seconds spent running, excluding any time spent stopped.
    pub fn total_elapsed(&self, now: Instant) -> f64 {
        self.total_duration(now).as_secs_f64()
    }

    /// Seconds recorded by each finished lap, in the order they were taken.
    ///
    /// The current lap is still open and is reported by [`Timer::current_lap_elapsed`] instead.
    pub fn laps(&self, now: Instant) -> Vec<f64> {
        let Some((_, finished)) = self.laps.split_last() else {
            return Vec::new();
        };

        finished
            .iter()
            .filter(|lap| lap.phase == Phase::Stopped)
            .map(|lap| lap.total_elapsed(now))
            .collect()
    }

    pub fn current_lap_elapsed(&self, now: Instant) -> f64 {
        match self.laps.last() {
            Some(lap) => lap.total_elapsed(now),
            None => self.total_elapsed(now),
        }
    }

    pub fn snapshot(&self, now: Instant) -> Snapshot {
        Snapshot::new(self.total_elapsed(now), self.current_lap_elapsed(now))
    }

    fn segment(&self, now: Instant) -> Duration {
        self.clock
            .duration_between(self.start, Some(self.stop.unwrap_or(now)))
    }
}
