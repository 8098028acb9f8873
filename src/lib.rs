//! Chihuahua Run - an endless runner chased by a boss
//!
//! Core modules:
//! - `sim`: Real-time game-state core (hazards, player actions, boss, score)
//! - `tuning`: Data-driven game balance
//! - `session`: Host glue dispatching side effects at phase transitions
//! - `persistence`: Key/value storage and run history
//! - `highscores`: Local ranking table and remote ranking boundary
//! - `inventory`: Item quantities consumed/granted by the core
//! - `rewards`: Wallet-gated reward claim state
//! - `platform`: Browser/native platform helpers

pub mod highscores;
pub mod inventory;
pub mod persistence;
pub mod platform;
pub mod rewards;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (tab switches, stalls)
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Lives at run start and the heal cap
    pub const MAX_LIVES: f32 = 3.0;
    /// Lives at or below this count as exhausted (lives are fractional)
    pub const LIFE_EPSILON: f32 = 0.2;

    /// Obstacle progress past which it is force-deactivated
    pub const PROGRESS_SAFETY_BOUND: f32 = 1.6;
    /// Progress at which a hazard reaches the player
    pub const PROGRESS_AT_PLAYER: f32 = 1.0;

    /// Speed bounds (world units/s)
    pub const MIN_SPEED: f32 = 2.0;
    pub const MAX_SPEED: f32 = 5.0;

    /// Boss hits required for a defeat
    pub const BOSS_MAX_HITS: u32 = 10;

    /// Local run history cap (per user)
    pub const MAX_HISTORY_ENTRIES: usize = 100;

    /// Length of one day/night cycle in meters
    pub const DAY_CYCLE_METERS: f32 = 1000.0;
}
