//! Player actions, combo and lives
//!
//! Input never resolves anything directly: it only queues a dodge or duck
//! against the hazard currently approaching. The orchestrator resolves the
//! queue once the hazard enters its late window. All combo reads and writes
//! go through this one counter.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstacleKind;
use crate::consts::MAX_LIVES;
use crate::tuning::Tuning;

/// Cosmetic dodge variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DodgeAnimation {
    Jump,
    Sidestep,
    Backflip,
}

impl DodgeAnimation {
    /// Cumulative weights for a non-flock dodge
    const WEIGHTS: [(f32, DodgeAnimation); 3] = [
        (0.5, DodgeAnimation::Jump),
        (0.8, DodgeAnimation::Sidestep),
        (1.0, DodgeAnimation::Backflip),
    ];

    pub fn pick<R: Rng>(kind: ObstacleKind, rng: &mut R) -> Self {
        if kind.is_flock() {
            return DodgeAnimation::Jump;
        }
        let roll = rng.random::<f32>();
        Self::WEIGHTS
            .iter()
            .find(|(upper, _)| roll < *upper)
            .map(|(_, anim)| *anim)
            .unwrap_or(DodgeAnimation::Backflip)
    }
}

/// Current action animation (cleared by the action timer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Dodging(DodgeAnimation),
    Ducking,
}

/// Animation state published to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAnimation {
    Running,
    Dodging(DodgeAnimation),
    Ducking,
    Hit,
    Caught,
    Celebrating,
}

/// Which queue action a cut-in celebrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutInAction {
    Dodge,
    Duck,
}

impl CutInAction {
    fn lines(&self) -> &'static [&'static str] {
        match self {
            CutInAction::Dodge => &["WHOOSH!", "NOPE!", "TOO SLOW!", "YIP YIP!"],
            CutInAction::Duck => &["DUCK!", "MISSED ME!", "HEADS UP!"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutInSide {
    Left,
    Right,
}

/// Transient comic annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutIn {
    pub text: String,
    pub side: CutInSide,
}

/// Player state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Fractional: boss hits heal in small steps
    pub lives: f32,
    combo: u32,
    pub dodge_queued: bool,
    pub duck_queued: bool,
    /// Hit-stun flag
    pub hit: bool,
    /// Set for the duration of a dodge/duck
    pub invulnerable: bool,
    pub action: Option<PlayerAction>,
    /// Absorbs the life loss of the next hit
    pub shield: bool,
    pub cut_in: Option<CutIn>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            lives: MAX_LIVES,
            combo: 0,
            dodge_queued: false,
            duck_queued: false,
            hit: false,
            invulnerable: false,
            action: None,
            shield: false,
            cut_in: None,
        }
    }
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Queue a dodge against the active obstacle. No-op without one.
    pub fn queue_dodge(&mut self, obstacle_active: bool) -> bool {
        if !obstacle_active {
            return false;
        }
        self.dodge_queued = true;
        true
    }

    /// Queue a duck against the airborne projectile. No-op without one.
    pub fn queue_duck(&mut self, projectile_active: bool) -> bool {
        if !projectile_active {
            return false;
        }
        self.duck_queued = true;
        true
    }

    /// Resolve a queued dodge. Returns the combo after increment.
    pub fn perform_dodge<R: Rng>(&mut self, kind: ObstacleKind, rng: &mut R) -> u32 {
        self.dodge_queued = false;
        self.combo += 1;
        self.invulnerable = true;
        self.action = Some(PlayerAction::Dodging(DodgeAnimation::pick(kind, rng)));
        self.combo
    }

    /// Resolve a queued duck
    pub fn perform_duck(&mut self) {
        self.duck_queued = false;
        self.combo += 1;
        self.invulnerable = true;
        self.action = Some(PlayerAction::Ducking);
    }

    /// Lose one life. Returns the lives remaining.
    pub fn take_damage(&mut self) -> f32 {
        self.lives = (self.lives - 1.0).max(0.0);
        self.combo = 0;
        self.hit = true;
        self.lives
    }

    /// A hit that the shield absorbs still breaks the combo
    pub fn absorb_hit(&mut self) -> bool {
        if !self.shield {
            return false;
        }
        self.shield = false;
        self.combo = 0;
        self.hit = true;
        true
    }

    pub fn heal(&mut self, amount: f32) {
        self.lives = (self.lives + amount).min(MAX_LIVES);
    }

    pub fn clear_queues(&mut self) {
        self.dodge_queued = false;
        self.duck_queued = false;
    }

    /// Action timer expired
    pub fn end_action(&mut self) {
        self.action = None;
        self.invulnerable = false;
    }

    /// Hit timer expired
    pub fn clear_hit(&mut self) {
        self.hit = false;
    }

    /// Show a cut-in. `coords` are normalized screen coordinates of the
    /// input; the cut-in favours that side of the screen.
    pub fn trigger_cut_in<R: Rng>(
        &mut self,
        action: CutInAction,
        coords: Option<Vec2>,
        rng: &mut R,
        tuning: &Tuning,
    ) {
        let lines = action.lines();
        let text = lines[rng.random_range(0..lines.len())].to_string();

        let toward_left = rng.random_bool(tuning.cut_in_side_bias.clamp(0.0, 1.0));
        let side = match coords {
            Some(pos) if pos.x < 0.5 => {
                if toward_left { CutInSide::Left } else { CutInSide::Right }
            }
            Some(_) => {
                if toward_left { CutInSide::Right } else { CutInSide::Left }
            }
            None => {
                if rng.random_bool(0.5) { CutInSide::Left } else { CutInSide::Right }
            }
        };

        self.cut_in = Some(CutIn { text, side });
    }

    pub fn clear_cut_in(&mut self) {
        self.cut_in = None;
    }

    /// Animation while running (hit-stun wins over actions)
    pub fn animation(&self) -> PlayerAnimation {
        if self.hit {
            return PlayerAnimation::Hit;
        }
        match self.action {
            Some(PlayerAction::Dodging(variant)) => PlayerAnimation::Dodging(variant),
            Some(PlayerAction::Ducking) => PlayerAnimation::Ducking,
            None => PlayerAnimation::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_queue_requires_active_hazard() {
        let mut player = Player::new();
        assert!(!player.queue_dodge(false));
        assert!(!player.dodge_queued);
        assert!(!player.queue_duck(false));
        assert!(!player.duck_queued);

        assert!(player.queue_dodge(true));
        assert!(player.dodge_queued);
        // Queueing alone never scores
        assert_eq!(player.combo(), 0);
    }

    #[test]
    fn test_dodge_increments_combo_by_one() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut player = Player::new();
        player.queue_dodge(true);
        assert_eq!(player.perform_dodge(ObstacleKind::Car, &mut rng), 1);
        assert!(!player.dodge_queued);
        assert!(player.invulnerable);
        assert_eq!(player.perform_dodge(ObstacleKind::Rock, &mut rng), 2);
        player.perform_duck();
        assert_eq!(player.combo(), 3);
    }

    #[test]
    fn test_flock_forces_jump() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(DodgeAnimation::pick(ObstacleKind::Sheep, &mut rng), DodgeAnimation::Jump);
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let _ = seen.insert(format!("{:?}", DodgeAnimation::pick(ObstacleKind::Car, &mut rng)));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_damage_resets_combo() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut player = Player::new();
        player.perform_dodge(ObstacleKind::Car, &mut rng);
        player.perform_dodge(ObstacleKind::Car, &mut rng);

        assert_eq!(player.take_damage(), 2.0);
        assert_eq!(player.combo(), 0);
        assert!(player.hit);
        assert_eq!(player.animation(), PlayerAnimation::Hit);
    }

    #[test]
    fn test_heal_clamps_and_damage_floors() {
        let mut player = Player::new();
        player.heal(0.2);
        assert_eq!(player.lives, MAX_LIVES);

        player.lives = 0.6;
        assert_eq!(player.take_damage(), 0.0);
    }

    #[test]
    fn test_shield_absorbs_once() {
        let mut player = Player {
            shield: true,
            ..Player::default()
        };
        assert!(player.absorb_hit());
        assert_eq!(player.lives, MAX_LIVES);
        assert!(!player.absorb_hit());
    }

    #[test]
    fn test_cut_in_side_bias() {
        let tuning = Tuning {
            cut_in_side_bias: 1.0,
            ..Tuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut player = Player::new();

        player.trigger_cut_in(CutInAction::Dodge, Some(Vec2::new(0.1, 0.5)), &mut rng, &tuning);
        assert_eq!(player.cut_in.as_ref().map(|c| c.side), Some(CutInSide::Left));

        player.trigger_cut_in(CutInAction::Duck, Some(Vec2::new(0.9, 0.5)), &mut rng, &tuning);
        assert_eq!(player.cut_in.as_ref().map(|c| c.side), Some(CutInSide::Right));

        player.clear_cut_in();
        assert!(player.cut_in.is_none());
    }
}
