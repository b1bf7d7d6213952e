//! Fixed-cadence sampling of continuously varying rates
//!
//! Each simulator polls an instantaneous metric (crank speed, pour flow) far
//! more often than it wants to record it. `SampleClock` gates recording to a
//! fixed cadence and `RateSample` is the record it produces; scores are
//! computed from the recorded log, never from the raw polls.

use serde::{Deserialize, Serialize};

/// Gates an action to a fixed millisecond cadence
#[derive(Debug, Clone)]
pub struct SampleClock {
    interval_ms: f32,
    last_fire_ms: f32,
    fired: bool,
}

impl SampleClock {
    /// An interval of 0 fires on every call
    pub fn new(interval_ms: f32) -> Self {
        Self {
            interval_ms,
            last_fire_ms: 0.0,
            fired: false,
        }
    }

    /// True when firing at `now_ms` would be on cadence (first call is always due)
    pub fn due(&self, now_ms: f32) -> bool {
        !self.fired || now_ms - self.last_fire_ms >= self.interval_ms
    }

    /// Check the cadence and stamp it in one step; true when it fired
    pub fn try_fire(&mut self, now_ms: f32) -> bool {
        if self.due(now_ms) {
            self.last_fire_ms = now_ms;
            self.fired = true;
            true
        } else {
            false
        }
    }

    /// Forget all history, as if freshly constructed
    pub fn reset(&mut self) {
        self.last_fire_ms = 0.0;
        self.fired = false;
    }
}

/// One recorded reading of a rate metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    /// Simulation time of the reading in ms
    pub at_ms: f32,
    /// Instantaneous rate at that time (unit depends on the metric)
    pub rate: f32,
    /// Whether the rate sat inside the target band when read
    pub in_target: bool,
}
