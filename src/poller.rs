use crate::snapshot::Snapshot;
use crate::stopwatch::{lock, Shared};
use std::sync::{Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Producer end of a subscription. Holds a single snapshot; newer snapshots replace older ones.
pub(crate) struct Observation {
    sender: watch::Sender<Snapshot>,
    interval: Duration,
}

impl Observation {
    pub(crate) fn open(current: Snapshot, interval: Duration) -> (Self, Subscription) {
        let (sender, mut receiver) = watch::channel(current);
        // The current state is delivered on the first call to `next`.
        receiver.mark_changed();

        let observation = Self {
            sender,
            interval: interval.max(MIN_POLL_INTERVAL),
        };

        (observation, Subscription { receiver })
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.sender.send_replace(snapshot);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Periodic task sampling a stopwatch for one start/resume cycle. Dropping it cancels the task.
pub(crate) struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawns a poller on the current Tokio runtime. Returns `None` outside of a runtime.
    pub(crate) fn spawn(
        shared: Weak<Mutex<Shared>>,
        observation: &Observation,
        generation: u64,
    ) -> Option<Self> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(%e, "No runtime available to poll the stopwatch");
                return None;
            }
        };

        let sender = observation.sender.clone();
        let interval = observation.interval;

        tracing::trace!(generation, ?interval, "Spawning poller");

        let handle = runtime.spawn(run(shared, sender, interval, generation));

        Some(Self { handle })
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    shared: Weak<Mutex<Shared>>,
    sender: watch::Sender<Snapshot>,
    interval: Duration,
    generation: u64,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately and the state was published when the poller was armed.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = sender.closed() => {
                tracing::debug!(generation, "Subscription dropped, stopping the poller");
                break;
            }
            _ = ticker.tick() => {
                if !tick(&shared, &sender, generation) {
                    tracing::trace!(generation, "Poller is stale");
                    break;
                }
            }
        }
    }
}

/// Publishes the current snapshot unless the stopwatch is gone or this poller was superseded.
fn tick(shared: &Weak<Mutex<Shared>>, sender: &watch::Sender<Snapshot>, generation: u64) -> bool {
    let Some(shared) = shared.upgrade() else {
        return false;
    };

    let guard = lock(&shared);
    if guard.generation() != generation {
        return false;
    }

    sender.send_replace(guard.snapshot());
    true
}

/// Consumer end of [`crate::Stopwatch::poll`].
///
/// The first call to [`Subscription::next`] returns the state at subscription time without
/// waiting. Afterwards a snapshot arrives every interval while the stopwatch runs. A slow consumer
/// only sees the newest snapshot. Dropping the subscription cancels the polling task.
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<Snapshot>,
}

impl Subscription {
    /// Waits for the next snapshot. Returns `None` once the stopwatch is dropped or a newer
    /// subscription replaced this one.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// The most recently published snapshot, without waiting.
    pub fn latest(&self) -> Snapshot {
        *self.receiver.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_first_next_returns_current() {
        let current = Snapshot::new(1.5, 0.25);
        let (_observation, mut subscription) = Observation::open(current, DEFAULT_POLL_INTERVAL);

        assert_eq!(subscription.next().await, Some(current));
    }

    #[tokio::test]
    async fn test_keeps_only_newest() {
        let (observation, mut subscription) =
            Observation::open(Snapshot::default(), DEFAULT_POLL_INTERVAL);

        observation.publish(Snapshot::new(0.1, 0.1));
        observation.publish(Snapshot::new(0.2, 0.1));
        observation.publish(Snapshot::new(0.3, 0.2));

        assert_eq!(subscription.next().await, Some(Snapshot::new(0.3, 0.2)));
        assert_eq!(subscription.latest(), Snapshot::new(0.3, 0.2));
    }

    #[tokio::test]
    async fn test_finishes_when_observation_dropped() {
        let (observation, mut subscription) =
            Observation::open(Snapshot::default(), DEFAULT_POLL_INTERVAL);

        assert_eq!(subscription.next().await, Some(Snapshot::default()));
        drop(observation);
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn test_closed_once_subscription_dropped() {
        let (observation, subscription) =
            Observation::open(Snapshot::default(), DEFAULT_POLL_INTERVAL);

        assert!(!observation.is_closed());
        drop(subscription);
        assert!(observation.is_closed());
    }

    #[test]
    fn test_interval_clamped() {
        let (observation, _subscription) = Observation::open(Snapshot::default(), Duration::ZERO);

        assert_eq!(observation.interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn test_spawn_outside_runtime() {
        let (observation, _subscription) =
            Observation::open(Snapshot::default(), DEFAULT_POLL_INTERVAL);

        assert!(Poller::spawn(Weak::new(), &observation, 0).is_none());
    }
}
