//! Boss-thrown projectiles
//!
//! Throws run on their own randomized cadence. A throw starts with a short
//! wind-up (the `throwing` flag) and the projectile is released when the
//! orchestrator's release timer fires. Flight speed scales with boss level and
//! shrinks with start height.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::approach::{Approach, SpawnClock, draw_interval};
use super::boss::BossType;
use crate::consts::{MAX_LIVES, PROGRESS_AT_PLAYER};
use crate::tuning::Tuning;

/// Projectile types, two per boss type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Banana,
    Barrel,
    Bolt,
    Missile,
    Fireball,
    Meteor,
}

impl ProjectileKind {
    /// The two projectile types a boss type can throw
    pub fn pair_for(boss: BossType) -> [ProjectileKind; 2] {
        match boss {
            BossType::Gorilla => [ProjectileKind::Banana, ProjectileKind::Barrel],
            BossType::Robot => [ProjectileKind::Bolt, ProjectileKind::Missile],
            BossType::Dragon => [ProjectileKind::Fireball, ProjectileKind::Meteor],
        }
    }
}

/// Result of one projectile tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTick {
    pub active: bool,
    pub progress: f32,
    /// Reached the player this tick (reported once per projectile)
    pub finished: bool,
}

/// Parameters captured when the throw started
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct PendingThrow {
    lives: f32,
    boss: BossType,
}

/// Projectile subsystem state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectiles {
    pub approach: Approach,
    pub kind: ProjectileKind,
    /// Wind-up in progress: not active yet, but blocks other spawns
    pub throwing: bool,
    pub start_height: f32,
    /// A duck has already resolved against this projectile
    pub ducked: bool,
    pending: Option<PendingThrow>,
    pub(crate) clock: SpawnClock,
}

impl Projectiles {
    pub fn new<R: Rng>(rng: &mut R, tuning: &Tuning) -> Self {
        Self {
            approach: Approach::default(),
            kind: ProjectileKind::default(),
            throwing: false,
            start_height: 1.0,
            ducked: false,
            pending: None,
            clock: SpawnClock::new(Self::draw_next(rng, tuning)),
        }
    }

    fn draw_next<R: Rng>(rng: &mut R, tuning: &Tuning) -> f32 {
        draw_interval(rng, tuning.projectile_interval_min, tuning.projectile_interval_max)
    }

    pub fn is_active(&self) -> bool {
        self.approach.active
    }

    /// Neither airborne nor winding up
    pub fn is_idle(&self) -> bool {
        !self.approach.active && !self.throwing
    }

    pub fn progress(&self) -> f32 {
        self.approach.progress
    }

    /// Accumulate the throw clock. The clock only runs while no projectile
    /// is active or winding up and `spawn_allowed` holds.
    pub fn check_spawn(&mut self, delta: f32, spawn_allowed: bool) -> bool {
        if !self.is_idle() || !spawn_allowed {
            return false;
        }
        self.clock.accumulate(delta)
    }

    /// Begin the wind-up. The caller schedules `release` after the wind-up
    /// delay.
    pub fn trigger_throw<R: Rng>(&mut self, lives: f32, boss: BossType, rng: &mut R, tuning: &Tuning) {
        self.throwing = true;
        self.pending = Some(PendingThrow { lives, boss });
        self.clock.restart(Self::draw_next(rng, tuning));
        log::debug!("{:?} winding up a throw", boss);
    }

    /// End the wind-up and put the projectile in flight. Returns the kind
    /// released, or None if no throw was pending.
    pub fn release<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) -> Option<ProjectileKind> {
        let pending = self.pending.take()?;
        self.throwing = false;

        let life_fraction = (pending.lives / MAX_LIVES).clamp(0.0, 1.0);
        self.start_height =
            tuning.projectile_height_base + tuning.projectile_height_per_life_fraction * life_fraction;
        let pair = ProjectileKind::pair_for(pending.boss);
        self.kind = pair[usize::from(rng.random_bool(0.5))];
        self.ducked = false;
        self.approach.activate();

        log::debug!(
            "Projectile released: {:?} from height {:.2}",
            self.kind,
            self.start_height
        );
        Some(self.kind)
    }

    /// Advance an airborne projectile
    pub fn tick(&mut self, delta: f32, speed: f32, boss_level: u32, tuning: &Tuning) -> ProjectileTick {
        let mut finished = false;
        if self.approach.active {
            let flight = (speed * delta * tuning.level_multiplier(boss_level)) / self.start_height.max(1.0);
            self.approach.advance(flight);
            if self.approach.progress >= PROGRESS_AT_PLAYER {
                self.approach.deactivate();
                finished = true;
            }
        }

        ProjectileTick {
            active: self.approach.active,
            progress: self.approach.progress,
            finished,
        }
    }

    /// Drop any airborne or winding-up projectile and restart the clock
    pub fn clear<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) {
        self.approach.deactivate();
        self.throwing = false;
        self.pending = None;
        self.ducked = false;
        self.clock.restart(Self::draw_next(rng, tuning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (Projectiles, Pcg32, Tuning) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let projectiles = Projectiles::new(&mut rng, &tuning);
        (projectiles, rng, tuning)
    }

    #[test]
    fn test_check_spawn_interval() {
        let (mut p, _rng, _tuning) = setup();
        assert!(!p.check_spawn(3.9, true));
        assert!(p.check_spawn(4.2, true));
    }

    #[test]
    fn test_clock_blocked_while_not_allowed() {
        let (mut p, _rng, _tuning) = setup();
        for _ in 0..100 {
            assert!(!p.check_spawn(0.1, false));
        }
        // Nothing accumulated while blocked
        assert!(!p.check_spawn(3.9, true));
    }

    #[test]
    fn test_windup_blocks_and_release_activates() {
        let (mut p, mut rng, tuning) = setup();
        p.trigger_throw(3.0, BossType::Robot, &mut rng, &tuning);
        assert!(p.throwing);
        assert!(!p.is_active());
        assert!(!p.is_idle());
        assert!(!p.check_spawn(100.0, true));

        let kind = p.release(&mut rng, &tuning).expect("pending throw");
        assert!(ProjectileKind::pair_for(BossType::Robot).contains(&kind));
        assert!(p.is_active());
        assert!(!p.throwing);
        assert_eq!(p.start_height, 6.0);
        assert!(p.release(&mut rng, &tuning).is_none());
    }

    #[test]
    fn test_flight_speed_and_single_finish() {
        let (mut p, mut rng, tuning) = setup();
        // Zero lives -> start height 2.0
        p.trigger_throw(0.0, BossType::Gorilla, &mut rng, &tuning);
        p.release(&mut rng, &tuning);
        assert_eq!(p.start_height, 2.0);

        // speed 2 * dt 0.1 * level-1 multiplier 5 / height 2 = 0.5
        let t = p.tick(0.1, 2.0, 1, &tuning);
        assert!((t.progress - 0.5).abs() < 1e-5);
        assert!(!t.finished);

        let t = p.tick(0.1, 2.0, 1, &tuning);
        assert!(t.finished);
        assert!(!t.active);

        let t = p.tick(0.1, 2.0, 1, &tuning);
        assert!(!t.finished);
    }

    #[test]
    fn test_higher_level_flies_faster() {
        let (mut a, mut rng, tuning) = setup();
        let mut b = a.clone();
        a.trigger_throw(3.0, BossType::Dragon, &mut rng, &tuning);
        a.release(&mut rng, &tuning);
        b.trigger_throw(3.0, BossType::Dragon, &mut rng, &tuning);
        b.release(&mut rng, &tuning);

        let slow = a.tick(0.05, 3.0, 1, &tuning);
        let fast = b.tick(0.05, 3.0, 3, &tuning);
        assert!(fast.progress > slow.progress);
    }

    #[test]
    fn test_clear_cancels_windup() {
        let (mut p, mut rng, tuning) = setup();
        p.trigger_throw(2.0, BossType::Gorilla, &mut rng, &tuning);
        p.clear(&mut rng, &tuning);
        assert!(p.is_idle());
        assert!(p.release(&mut rng, &tuning).is_none());
    }
}
