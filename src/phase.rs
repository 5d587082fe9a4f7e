use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a timer. Every timer, laps included, begins `Initialized`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Created or reset and not yet started. A reset timer cannot be resumed.
    #[default]
    Initialized,
    /// Currently measuring time.
    Running,
    /// Stopped and able to resume. Time spent stopped is not counted.
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialized => f.write_str("initialized"),
            Phase::Running => f.write_str("running"),
            Phase::Stopped => f.write_str("stopped"),
        }
    }
}
