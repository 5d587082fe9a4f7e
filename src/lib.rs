//! Elapsed-time measurement with laps and live polling.
//!
//! A [`Stopwatch`] can be started, stopped, resumed, split into laps and reset from any task.
//! [`Stopwatch::poll`] returns a [`Subscription`] that yields [`Snapshot`]s while it runs.

pub mod clock;
pub mod phase;
pub mod poller;
pub mod snapshot;
pub mod stopwatch;
pub mod timer;

pub use clock::MonotonicClock;
pub use phase::Phase;
pub use poller::{Subscription, DEFAULT_POLL_INTERVAL};
pub use snapshot::Snapshot;
pub use stopwatch::Stopwatch;
pub use timer::Timer;
