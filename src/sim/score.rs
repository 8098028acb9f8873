//! Distance, score and the speed curve
//!
//! Milestones are detected by comparing the floor of the old and new
//! distance, so a long frame that crosses several meters (or several speed
//! steps) awards every one of them.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SPEED, MIN_SPEED};
use crate::tuning::Tuning;

/// What a distance update crossed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistanceUpdate {
    pub meters_crossed: u64,
    pub speed_steps: u64,
}

/// Score/distance state for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub score: u64,
    pub distance: f32,
    pub speed: f32,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self {
            score: 0,
            distance: 0.0,
            speed: MIN_SPEED,
        }
    }
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw distance delta (already scaled by speed and frame time)
    pub fn update_distance(&mut self, raw_delta: f32, tuning: &Tuning) -> DistanceUpdate {
        if raw_delta <= 0.0 {
            return DistanceUpdate::default();
        }
        let old = self.distance;
        let new = old + raw_delta;
        self.distance = new;

        let meters_crossed = (new.floor() - old.floor()).max(0.0) as u64;
        self.score += meters_crossed * tuning.points_per_meter;

        let step = tuning.speed_step_meters.max(f32::EPSILON);
        let speed_steps = ((new / step).floor() - (old / step).floor()).max(0.0) as u64;
        if speed_steps > 0 {
            self.speed = (self.speed + tuning.speed_increment * speed_steps as f32).min(MAX_SPEED);
        }

        DistanceUpdate {
            meters_crossed,
            speed_steps,
        }
    }

    /// Add points; fractional amounts are floored so score stays integral
    pub fn add_score(&mut self, amount: f64) {
        if amount > 0.0 {
            self.score += amount.floor() as u64;
        }
    }
}
