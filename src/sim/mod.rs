//! Real-time game-state core
//!
//! All gameplay logic lives here. This module is synchronous and never
//! suspends:
//! - One tick per rendered frame, fixed subsystem order
//! - Seeded RNG only (the host seeds from the clock)
//! - No rendering, storage or platform dependencies
//! - Side effects leave as `GameEvent`s

pub mod approach;
pub mod boss;
pub mod obstacle;
pub mod player;
pub mod projectile;
pub mod score;
pub mod state;
pub mod tick;
pub mod timer;

pub use approach::{Approach, SpawnClock};
pub use boss::{Boss, BossHit, BossType};
pub use obstacle::{ObstacleKind, ObstacleSpawn, Obstacles};
pub use player::{CutIn, CutInSide, DodgeAnimation, Player, PlayerAnimation};
pub use projectile::{ProjectileKind, Projectiles};
pub use score::ScoreBoard;
pub use state::{
    FrameSnapshot, GameEvent, GamePhase, GameState, Identity, RunMode, RunState, ScoreEntry,
};
pub use tick::{TickInput, tick};
pub use timer::{ScopedTimers, TimerKind};
