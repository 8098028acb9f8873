//! Boss progression
//!
//! The boss chases the player from behind. Dodged obstacles carry on and hit
//! it; ten hits defeat it. A defeat either brings in a stronger boss after a
//! delay or, at the last level of the last boss type, clears the game.

use serde::{Deserialize, Serialize};

use crate::consts::{BOSS_MAX_HITS, MAX_LIVES};
use crate::tuning::Tuning;

/// Boss types in order of appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BossType {
    #[default]
    Gorilla,
    Robot,
    Dragon,
}

impl BossType {
    /// The type that follows this one, None for the last
    pub fn next(&self) -> Option<BossType> {
        match self {
            BossType::Gorilla => Some(BossType::Robot),
            BossType::Robot => Some(BossType::Dragon),
            BossType::Dragon => None,
        }
    }
}

/// What a hit did to the boss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossHit {
    /// Boss is mid-defeat and cannot be hit
    Ignored,
    /// Hit landed, boss still standing
    Landed { hits_taken: u32 },
    /// Hit landed and defeated the boss
    Defeated { terminal: bool },
}

/// Boss state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub boss_type: BossType,
    /// 1-based level within the boss type
    pub level: u32,
    pub hits_taken: u32,
    pub defeated: bool,
    /// Brief flash after each hit
    pub hit_flash: bool,
}

impl Default for Boss {
    fn default() -> Self {
        Self {
            boss_type: BossType::default(),
            level: 1,
            hits_taken: 0,
            defeated: false,
            hit_flash: false,
        }
    }
}

impl Boss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level of the last boss type
    pub fn is_final(&self, tuning: &Tuning) -> bool {
        self.boss_type.next().is_none() && self.level >= tuning.boss_max_level
    }

    /// Remaining boss life in [0, 1]
    pub fn life_fraction(&self) -> f32 {
        1.0 - self.hits_taken.min(BOSS_MAX_HITS) as f32 / BOSS_MAX_HITS as f32
    }

    /// Obstacle progress at which a dodged obstacle reaches the boss. The
    /// boss closes in as the player loses lives.
    pub fn position(&self, lives: f32, tuning: &Tuning) -> f32 {
        let fraction = (lives / MAX_LIVES).clamp(0.0, 1.0);
        tuning.boss_near_progress + (tuning.boss_far_progress - tuning.boss_near_progress) * fraction
    }

    pub fn register_hit(&mut self, tuning: &Tuning) -> BossHit {
        if self.defeated {
            return BossHit::Ignored;
        }
        self.hits_taken += 1;
        if self.hits_taken >= BOSS_MAX_HITS {
            self.hits_taken = BOSS_MAX_HITS;
            self.defeated = true;
            BossHit::Defeated {
                terminal: self.is_final(tuning),
            }
        } else {
            BossHit::Landed {
                hits_taken: self.hits_taken,
            }
        }
    }

    /// Bring in the next boss after a non-terminal defeat
    pub fn advance(&mut self, tuning: &Tuning) {
        if self.level < tuning.boss_max_level {
            self.level += 1;
        } else if let Some(next) = self.boss_type.next() {
            self.boss_type = next;
            self.level = 1;
        }
        self.hits_taken = 0;
        self.defeated = false;
        self.hit_flash = false;
    }
}
