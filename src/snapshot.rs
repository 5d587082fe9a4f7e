use serde::{Deserialize, Serialize};

/// Point-in-time reading of a stopwatch, computed from a single read of its state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub total_elapsed: f64,
    pub current_lap_elapsed: f64,
}

impl Snapshot {
    pub fn new(total_elapsed: f64, current_lap_elapsed: f64) -> Self {
        Self {
            total_elapsed,
            current_lap_elapsed,
        }
    }
}
