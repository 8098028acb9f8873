//! Data-driven game balance
//!
//! Every gameplay number lives here so a run can be re-tuned from JSON
//! without touching the simulation. `Tuning::default()` is the canonical set.

use serde::{Deserialize, Serialize};

/// Balance parameters consumed by the simulation subsystems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Obstacles ===
    /// Seconds between obstacles, drawn uniformly from [min, max)
    pub obstacle_interval_min: f32,
    pub obstacle_interval_max: f32,
    /// Progress gained per (speed * second)
    pub obstacle_approach_rate: f32,
    /// Cumulative draw thresholds: r < car -> Car, r < animal -> Animal,
    /// r < sheep -> Sheep, else Rock
    pub obstacle_car_threshold: f32,
    pub obstacle_animal_threshold: f32,
    pub obstacle_sheep_threshold: f32,
    /// Danger indicator placement range (percent of screen, both axes)
    pub indicator_min_percent: f32,
    pub indicator_max_percent: f32,

    // === Projectiles ===
    /// Seconds between throws, drawn uniformly from [min, max)
    pub projectile_interval_min: f32,
    pub projectile_interval_max: f32,
    /// Throw wind-up before the projectile is released (seconds)
    pub throw_windup: f32,
    /// Level multiplier = base + (level - 1) * step
    pub projectile_level_base: f32,
    pub projectile_level_step: f32,
    /// Start height = base + per_life_fraction * (lives / max lives)
    pub projectile_height_base: f32,
    pub projectile_height_per_life_fraction: f32,

    // === Player ===
    /// Obstacle progress past which a queued dodge resolves
    pub dodge_window: f32,
    /// Projectile progress past which a queued duck resolves
    pub duck_window: f32,
    /// Points for a resolved dodge/duck before combo bonus
    pub dodge_base_points: f64,
    /// Points per combo step
    pub combo_step_points: f64,
    /// Invulnerability + dodge animation (seconds)
    pub dodge_duration: f32,
    /// Hit-stun flag (seconds)
    pub hit_duration: f32,
    /// Cut-in lifetime (seconds)
    pub cut_in_duration: f32,
    /// Probability the cut-in lands on the same side as the input
    pub cut_in_side_bias: f64,

    // === Distance / speed ===
    /// Meters gained per (speed * second)
    pub meters_per_speed_second: f32,
    /// Score awarded per whole meter
    pub points_per_meter: u64,
    /// Meters between speed increases
    pub speed_step_meters: f32,
    /// Speed gained per step
    pub speed_increment: f32,

    // === Boss ===
    /// Obstacle progress where the boss stands at full player lives
    pub boss_far_progress: f32,
    /// Obstacle progress where the boss stands at zero player lives
    pub boss_near_progress: f32,
    /// Lives restored per boss hit
    pub boss_hit_heal: f32,
    /// Boss hit flash (seconds)
    pub boss_hit_flash: f32,
    /// Levels per boss type
    pub boss_max_level: u32,
    /// Bonus on a non-terminal defeat
    pub boss_defeat_bonus: f64,
    /// Bonus on the final defeat
    pub game_clear_bonus: f64,
    /// Delay before the next boss level/type appears (seconds)
    pub boss_respawn_delay: f32,
    /// Hazard spawn freeze after a defeat (seconds)
    pub spawn_freeze: f32,

    // === Phase delays ===
    /// CAUGHT_ANIMATION -> GAME_OVER (seconds)
    pub caught_delay: f32,
    /// GAME_CLEAR -> GAME_OVER (seconds)
    pub clear_delay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            obstacle_interval_min: 1.5,
            obstacle_interval_max: 3.5,
            obstacle_approach_rate: 0.5,
            obstacle_car_threshold: 0.3,
            obstacle_animal_threshold: 0.6,
            obstacle_sheep_threshold: 0.8,
            indicator_min_percent: 20.0,
            indicator_max_percent: 80.0,

            projectile_interval_min: 4.0,
            projectile_interval_max: 8.0,
            throw_windup: 0.5,
            projectile_level_base: 5.0,
            projectile_level_step: 2.0,
            projectile_height_base: 2.0,
            projectile_height_per_life_fraction: 4.0,

            dodge_window: 0.85,
            duck_window: 0.90,
            dodge_base_points: 10.0,
            combo_step_points: 5.0,
            dodge_duration: 0.5,
            hit_duration: 1.5,
            cut_in_duration: 0.8,
            cut_in_side_bias: 0.75,

            meters_per_speed_second: 5.0,
            points_per_meter: 10,
            speed_step_meters: 50.0,
            speed_increment: 0.2 * 2.0 / 3.0,

            boss_far_progress: 1.4,
            boss_near_progress: 1.1,
            boss_hit_heal: 0.2,
            boss_hit_flash: 1.0,
            boss_max_level: 3,
            boss_defeat_bonus: 1000.0,
            game_clear_bonus: 20000.0,
            boss_respawn_delay: 3.0,
            spawn_freeze: 3.0,

            caught_delay: 3.0,
            clear_delay: 6.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Projectile level multiplier for a boss level (1-based)
    pub fn level_multiplier(&self, boss_level: u32) -> f32 {
        self.projectile_level_base + boss_level.saturating_sub(1) as f32 * self.projectile_level_step
    }

    /// Points for a resolved dodge/duck given the combo after increment
    pub fn dodge_points(&self, combo_after: u32) -> f64 {
        self.dodge_base_points + combo_after as f64 * self.combo_step_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "dodge_window": 0.8, "points_per_meter": 1 }"#).unwrap();
        assert_eq!(tuning.dodge_window, 0.8);
        assert_eq!(tuning.points_per_meter, 1);
        assert_eq!(tuning.duck_window, Tuning::default().duck_window);
    }

    #[test]
    fn test_level_multiplier() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level_multiplier(1), 5.0);
        assert_eq!(tuning.level_multiplier(3), 9.0);
    }

    #[test]
    fn test_dodge_points() {
        let tuning = Tuning::default();
        assert_eq!(tuning.dodge_points(1), 15.0);
        assert_eq!(tuning.dodge_points(4), 30.0);
    }
}
