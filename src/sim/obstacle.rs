//! Ground obstacles
//!
//! One obstacle at a time approaches the player. This module only spawns and
//! advances it; dodge/hit/boss resolution is done by the orchestrator, which
//! reads `progress` against the thresholds.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::approach::{Approach, SpawnClock, draw_interval};
use crate::consts::PROGRESS_SAFETY_BOUND;
use crate::tuning::Tuning;

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Rock,
    Car,
    Animal,
    /// A flock of sheep - always jumped over
    Sheep,
}

impl ObstacleKind {
    /// Map a uniform roll in [0, 1) onto the weighted type table
    pub fn from_roll(roll: f32, tuning: &Tuning) -> Self {
        if roll < tuning.obstacle_car_threshold {
            ObstacleKind::Car
        } else if roll < tuning.obstacle_animal_threshold {
            ObstacleKind::Animal
        } else if roll < tuning.obstacle_sheep_threshold {
            ObstacleKind::Sheep
        } else {
            ObstacleKind::Rock
        }
    }

    /// Flock obstacles force the jump animation
    pub fn is_flock(&self) -> bool {
        *self == ObstacleKind::Sheep
    }
}

/// Spawn details for the danger indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpawn {
    pub kind: ObstacleKind,
    /// Indicator position, percent of screen on both axes
    pub indicator: Vec2,
}

/// Result of one obstacle tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleTick {
    pub active: bool,
    pub progress: f32,
    pub spawned: Option<ObstacleSpawn>,
    /// Obstacle overshot the safety bound and was force-deactivated
    pub expired: bool,
}

/// Obstacle subsystem state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacles {
    pub approach: Approach,
    pub kind: ObstacleKind,
    pub indicator: Vec2,
    /// A dodge has already resolved against this spawn
    pub dodged: bool,
    clock: SpawnClock,
}

impl Obstacles {
    pub fn new<R: Rng>(rng: &mut R, tuning: &Tuning) -> Self {
        Self {
            approach: Approach::default(),
            kind: ObstacleKind::default(),
            indicator: Vec2::splat(50.0),
            dodged: false,
            clock: SpawnClock::new(Self::draw_next(rng, tuning)),
        }
    }

    fn draw_next<R: Rng>(rng: &mut R, tuning: &Tuning) -> f32 {
        draw_interval(rng, tuning.obstacle_interval_min, tuning.obstacle_interval_max)
    }

    pub fn is_active(&self) -> bool {
        self.approach.active
    }

    pub fn progress(&self) -> f32 {
        self.approach.progress
    }

    /// Advance one frame.
    ///
    /// `spawn_allowed` is false while a projectile is active or winding up,
    /// or while spawning is frozen; the interval clock does not accumulate
    /// then.
    pub fn tick<R: Rng>(
        &mut self,
        delta: f32,
        speed: f32,
        spawn_allowed: bool,
        rng: &mut R,
        tuning: &Tuning,
    ) -> ObstacleTick {
        let mut spawned = None;
        let mut expired = false;

        if !self.approach.active {
            if spawn_allowed && self.clock.accumulate(delta) {
                spawned = Some(self.spawn(rng, tuning));
            }
        } else {
            self.approach
                .advance(tuning.obstacle_approach_rate * speed * delta);
            if self.approach.progress > PROGRESS_SAFETY_BOUND {
                log::warn!(
                    "Obstacle {:?} overshot to {:.2} unresolved, resetting",
                    self.kind,
                    self.approach.progress
                );
                self.approach.deactivate();
                expired = true;
            }
        }

        ObstacleTick {
            active: self.approach.active,
            progress: self.approach.progress,
            spawned,
            expired,
        }
    }

    fn spawn<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) -> ObstacleSpawn {
        self.kind = ObstacleKind::from_roll(rng.random::<f32>(), tuning);
        let (lo, hi) = (tuning.indicator_min_percent, tuning.indicator_max_percent);
        self.indicator = Vec2::new(draw_interval(rng, lo, hi), draw_interval(rng, lo, hi));
        self.approach.activate();
        self.dodged = false;
        self.clock.restart(Self::draw_next(rng, tuning));

        log::debug!("Obstacle spawned: {:?} at {:?}", self.kind, self.indicator);
        ObstacleSpawn {
            kind: self.kind,
            indicator: self.indicator,
        }
    }

    /// Resolution finished with this obstacle (hit or boss collision)
    pub fn deactivate(&mut self) {
        self.approach.deactivate();
    }

    /// Clear the obstacle immediately and restart the interval clock
    pub fn clear<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) {
        self.approach.deactivate();
        self.dodged = false;
        self.clock.restart(Self::draw_next(rng, tuning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (Obstacles, Pcg32, Tuning) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let obstacles = Obstacles::new(&mut rng, &tuning);
        (obstacles, rng, tuning)
    }

    #[test]
    fn test_kind_thresholds() {
        let tuning = Tuning::default();
        assert_eq!(ObstacleKind::from_roll(0.0, &tuning), ObstacleKind::Car);
        assert_eq!(ObstacleKind::from_roll(0.29, &tuning), ObstacleKind::Car);
        assert_eq!(ObstacleKind::from_roll(0.3, &tuning), ObstacleKind::Animal);
        assert_eq!(ObstacleKind::from_roll(0.59, &tuning), ObstacleKind::Animal);
        assert_eq!(ObstacleKind::from_roll(0.6, &tuning), ObstacleKind::Sheep);
        assert_eq!(ObstacleKind::from_roll(0.8, &tuning), ObstacleKind::Rock);
        assert_eq!(ObstacleKind::from_roll(0.99, &tuning), ObstacleKind::Rock);
    }

    #[test]
    fn test_spawns_after_interval() {
        let (mut obstacles, mut rng, tuning) = setup();
        // Below the minimum interval nothing spawns
        let t = obstacles.tick(1.4, 2.0, true, &mut rng, &tuning);
        assert!(t.spawned.is_none());
        assert!(!t.active);

        // Past the maximum interval it must have spawned
        let t = obstacles.tick(2.2, 2.0, true, &mut rng, &tuning);
        let spawn = t.spawned.expect("should spawn after 3.6s");
        assert!(t.active);
        assert_eq!(t.progress, 0.0);
        assert!((20.0..80.0).contains(&spawn.indicator.x));
        assert!((20.0..80.0).contains(&spawn.indicator.y));
    }

    #[test]
    fn test_clock_frozen_when_not_allowed() {
        let (mut obstacles, mut rng, tuning) = setup();
        for _ in 0..100 {
            let t = obstacles.tick(0.1, 2.0, false, &mut rng, &tuning);
            assert!(t.spawned.is_none());
        }
        assert!(!obstacles.is_active());
    }

    #[test]
    fn test_progress_rate() {
        let (mut obstacles, mut rng, tuning) = setup();
        obstacles.tick(4.0, 2.0, true, &mut rng, &tuning);
        assert!(obstacles.is_active());

        // 0.5 * speed 2.0 * 0.1s = 0.1 per tick
        let t = obstacles.tick(0.1, 2.0, true, &mut rng, &tuning);
        assert!((t.progress - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_safety_bound_deactivates() {
        let (mut obstacles, mut rng, tuning) = setup();
        obstacles.tick(4.0, 2.0, true, &mut rng, &tuning);

        let mut expired = 0;
        for _ in 0..40 {
            let t = obstacles.tick(0.1, 2.0, true, &mut rng, &tuning);
            if t.expired {
                expired += 1;
                assert!(!t.active);
                assert!(t.progress > PROGRESS_SAFETY_BOUND);
            }
            if !t.active {
                break;
            }
        }
        assert_eq!(expired, 1);
    }
}
