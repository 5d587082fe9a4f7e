use std::time::Duration;
use tokio::time::Instant;

/// Monotonic time source backed by the Tokio clock.
///
/// Tokio's clock follows `std::time::Instant` in production and can be paused and advanced in
/// tests, which keeps timing assertions deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    /// Time elapsed from `start` until `end`, or until now when `end` is absent.
    ///
    /// Nothing has elapsed when there is no `start`.
    pub fn duration_between(&self, start: Option<Instant>, end: Option<Instant>) -> Duration {
        match start {
            Some(start) => end
                .unwrap_or_else(|| self.now())
                .saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn seconds_between(&self, start: Option<Instant>, end: Option<Instant>) -> f64 {
        self.duration_between(start, end).as_secs_f64()
    }
}
