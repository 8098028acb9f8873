//! Approach progress and spawn cadence primitives
//!
//! A hazard is a single scalar `progress`: 0 at spawn, 1 at the player, and
//! anything past that is overshoot toward the boss and the safety bound.
//! Spawning is a randomized interval clock that only runs while allowed.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Progress of one hazard toward the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    pub active: bool,
    pub progress: f32,
}

impl Approach {
    /// Start a fresh approach at progress 0
    pub fn activate(&mut self) {
        self.active = true;
        self.progress = 0.0;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn advance(&mut self, amount: f32) {
        if !self.active {
            return;
        }
        self.progress += amount.max(0.0);
    }

    /// Active and strictly past `threshold`
    pub fn beyond(&self, threshold: f32) -> bool {
        self.active && self.progress > threshold
    }
}

/// Randomized interval clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnClock {
    pub since_last: f32,
    pub next: f32,
}

impl SpawnClock {
    pub fn new(next: f32) -> Self {
        Self {
            since_last: 0.0,
            next,
        }
    }

    /// Accumulate `dt`; true once the elapsed time exceeds the threshold
    pub fn accumulate(&mut self, dt: f32) -> bool {
        self.since_last += dt;
        self.since_last > self.next
    }

    /// Reset elapsed time and set a new threshold
    pub fn restart(&mut self, next: f32) {
        self.since_last = 0.0;
        self.next = next;
    }
}

/// Uniform draw from [min, max); degenerate ranges collapse to `min`
pub fn draw_interval<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}
