//! Game state and core simulation types
//!
//! One `GameState` holds every subsystem of a run plus the top-level phase.
//! Side effects leave the core only as `GameEvent`s, drained by the host.

use chrono::{DateTime, Utc};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, BossType};
use super::obstacle::{ObstacleKind, ObstacleSpawn, Obstacles};
use super::player::{CutIn, CutInAction, Player, PlayerAnimation};
use super::projectile::{ProjectileKind, Projectiles};
use super::score::ScoreBoard;
use super::timer::{ScopedTimers, TimerKind};
use crate::consts::DAY_CYCLE_METERS;
use crate::inventory::ItemKind;
use crate::tuning::Tuning;

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Title,
    /// Local run history screen
    History,
    /// Ranking screen
    Ranking,
    /// Active gameplay
    Running,
    /// Frame tick frozen
    Paused,
    /// Lives exhausted; the boss catches the player
    CaughtAnimation,
    /// Run ended (scores shown)
    GameOver,
    /// Final boss defeated
    GameClear,
}

impl GamePhase {
    /// Phases from which a new run may start
    pub fn can_start_run(&self) -> bool {
        matches!(
            self,
            GamePhase::Title | GamePhase::History | GamePhase::Ranking | GamePhase::GameOver
        )
    }
}

/// Player-driven or autopilot run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Normal,
    /// Autopilot plays; never persisted
    Demo,
}

/// Who is playing (both optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: Option<String>,
    pub wallet_address: Option<String>,
}

impl Identity {
    pub fn is_identified(&self) -> bool {
        self.username.is_some() || self.wallet_address.is_some()
    }

    /// Storage key suffix for per-user data
    pub fn storage_key(&self) -> &str {
        self.wallet_address
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("guest")
    }
}

/// Persisted summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub date: DateTime<Utc>,
    pub score: u64,
    pub distance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl ScoreEntry {
    pub fn new(score: u64, distance: f32, identity: &Identity) -> Self {
        Self {
            date: Utc::now(),
            score,
            distance,
            username: identity.username.clone(),
            wallet_address: identity.wallet_address.clone(),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.username.is_some() || self.wallet_address.is_some()
    }

    /// Player this run belongs to
    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            wallet_address: self.wallet_address.clone(),
        }
    }
}

/// Run statistics view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub score: u64,
    pub distance: f32,
    pub speed: f32,
    pub lives: f32,
    pub combo: u32,
}

/// Events emitted during a frame, in order of occurrence
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    ObstacleSpawned(ObstacleSpawn),
    /// Obstacle overshot the safety bound unresolved
    ObstacleExpired,
    ThrowStarted { boss: BossType },
    ProjectileReleased { kind: ProjectileKind },
    Dodged { kind: ObstacleKind, combo: u32, points: u64 },
    Ducked { kind: ProjectileKind, combo: u32, points: u64 },
    PlayerHit { lives: f32, shielded: bool },
    BossHit { hits_taken: u32 },
    BossDefeated { boss: BossType, level: u32, terminal: bool, bonus: u64 },
    BossArrived { boss: BossType, level: u32 },
    SpeedUp { speed: f32 },
    ItemGranted { kind: ItemKind, quantity: u32 },
    ItemUsed { kind: ItemKind },
    /// Run reached GAME_OVER
    GameOver { score: u64, distance: f32 },
    /// Persistable run summary (non-demo, non-zero score); at most once per run
    RunCompleted(ScoreEntry),
}

/// Read-only per-frame view for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub hazard_active: bool,
    pub hazard_kind: ObstacleKind,
    pub hazard_progress: f32,
    pub hazard_indicator: Vec2,
    pub projectile_active: bool,
    pub projectile_throwing: bool,
    pub projectile_kind: ProjectileKind,
    pub projectile_progress: f32,
    pub player_animation: PlayerAnimation,
    pub boss: Boss,
    /// Boss health bar, 1 = untouched
    pub boss_life: f32,
    /// Seconds until the next boss arrives, while one is pending
    pub boss_respawn_in: Option<f32>,
    /// Position in the day/night cycle, [0, 1)
    pub day_time: f32,
    #[serde(flatten)]
    pub run: RunState,
    pub shield: bool,
    pub cut_in: Option<CutIn>,
    pub demo: bool,
}

/// Complete state of the game (one live session)
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub mode: RunMode,
    pub identity: Identity,
    pub score: ScoreBoard,
    pub player: Player,
    pub obstacles: Obstacles,
    pub projectiles: Projectiles,
    pub boss: Boss,
    pub timers: ScopedTimers,
    /// Set once the run has started ending; guards the end transitions
    pub(crate) game_ended: bool,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a game sitting on the title screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let obstacles = Obstacles::new(&mut rng, &tuning);
        let projectiles = Projectiles::new(&mut rng, &tuning);
        Self {
            tuning,
            phase: GamePhase::Title,
            mode: RunMode::Normal,
            identity: Identity::default(),
            score: ScoreBoard::new(),
            player: Player::new(),
            obstacles,
            projectiles,
            boss: Boss::new(),
            timers: ScopedTimers::new(),
            game_ended: false,
            rng,
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", from, to);
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    /// Reset every subsystem and enter RUNNING
    pub fn start_game(&mut self, mode: RunMode, identity: Identity) -> bool {
        if !self.phase.can_start_run() {
            return false;
        }
        self.score = ScoreBoard::new();
        self.player = Player::new();
        self.obstacles = Obstacles::new(&mut self.rng, &self.tuning);
        self.projectiles = Projectiles::new(&mut self.rng, &self.tuning);
        self.boss = Boss::new();
        self.timers.clear();
        self.game_ended = false;
        self.mode = mode;
        self.identity = identity;

        log::info!("Run started ({:?})", mode);
        self.set_phase(GamePhase::Running);
        true
    }

    /// RUNNING <-> PAUSED
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            GamePhase::Running => self.set_phase(GamePhase::Paused),
            GamePhase::Paused => self.set_phase(GamePhase::Running),
            _ => return false,
        }
        true
    }

    pub fn show_history(&mut self) -> bool {
        self.show_screen(GamePhase::History)
    }

    pub fn show_ranking(&mut self) -> bool {
        self.show_screen(GamePhase::Ranking)
    }

    fn show_screen(&mut self, screen: GamePhase) -> bool {
        if !self.phase.can_start_run() {
            return false;
        }
        self.set_phase(screen);
        true
    }

    pub fn back_to_title(&mut self) -> bool {
        if !self.phase.can_start_run() {
            return false;
        }
        self.set_phase(GamePhase::Title);
        true
    }

    /// Dodge input. Queues a dodge if an undodged obstacle is approaching.
    pub fn on_dodge_input(&mut self, coords: Option<Vec2>) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        let target = self.obstacles.is_active() && !self.obstacles.dodged;
        if !self.player.queue_dodge(target) {
            return false;
        }
        self.show_cut_in(CutInAction::Dodge, coords);
        true
    }

    /// Duck input. Queues a duck if a projectile is airborne.
    pub fn on_duck_input(&mut self, coords: Option<Vec2>) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        let target = self.projectiles.is_active() && !self.projectiles.ducked;
        if !self.player.queue_duck(target) {
            return false;
        }
        self.show_cut_in(CutInAction::Duck, coords);
        true
    }

    fn show_cut_in(&mut self, action: CutInAction, coords: Option<Vec2>) {
        self.player
            .trigger_cut_in(action, coords, &mut self.rng, &self.tuning);
        self.timers
            .start(TimerKind::CutIn, self.tuning.cut_in_duration);
    }

    /// Items can only be used mid-run
    pub fn can_use_item(&self, kind: ItemKind) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        match kind {
            ItemKind::Treat => self.player.lives < crate::consts::MAX_LIVES,
            ItemKind::Shield => !self.player.shield,
        }
    }

    /// Apply an item the host has already taken from the inventory
    pub fn use_item(&mut self, kind: ItemKind) -> bool {
        if !self.can_use_item(kind) {
            return false;
        }
        match kind {
            ItemKind::Treat => self.player.heal(1.0),
            ItemKind::Shield => self.player.shield = true,
        }
        self.emit(GameEvent::ItemUsed { kind });
        true
    }

    pub fn run_state(&self) -> RunState {
        RunState {
            score: self.score.score,
            distance: self.score.distance,
            speed: self.score.speed,
            lives: self.player.lives,
            combo: self.player.combo(),
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let player_animation = match self.phase {
            GamePhase::CaughtAnimation => PlayerAnimation::Caught,
            GamePhase::GameClear => PlayerAnimation::Celebrating,
            _ => self.player.animation(),
        };
        FrameSnapshot {
            phase: self.phase,
            hazard_active: self.obstacles.is_active(),
            hazard_kind: self.obstacles.kind,
            hazard_progress: self.obstacles.progress(),
            hazard_indicator: self.obstacles.indicator,
            projectile_active: self.projectiles.is_active(),
            projectile_throwing: self.projectiles.throwing,
            projectile_kind: self.projectiles.kind,
            projectile_progress: self.projectiles.progress(),
            player_animation,
            boss: self.boss.clone(),
            boss_life: self.boss.life_fraction(),
            boss_respawn_in: self.timers.remaining(TimerKind::BossRespawn),
            day_time: (self.score.distance % DAY_CYCLE_METERS) / DAY_CYCLE_METERS,
            run: self.run_state(),
            shield: self.player.shield,
            cut_in: self.player.cut_in.clone(),
            demo: self.mode == RunMode::Demo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> GameState {
        let mut state = GameState::new(1234, Tuning::default());
        assert!(state.start_game(RunMode::Normal, Identity::default()));
        state
    }

    #[test]
    fn test_new_game_on_title() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, GamePhase::Title);
        let run = state.run_state();
        assert_eq!(run.score, 0);
        assert_eq!(run.lives, 3.0);
        assert_eq!(run.speed, crate::consts::MIN_SPEED);
    }

    #[test]
    fn test_start_only_from_title_like_phases() {
        let mut state = running();
        assert!(!state.start_game(RunMode::Normal, Identity::default()));
        state.toggle_pause();
        assert!(!state.start_game(RunMode::Normal, Identity::default()));
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = running();
        assert!(state.toggle_pause());
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(state.toggle_pause());
        assert_eq!(state.phase, GamePhase::Running);

        let mut title = GameState::new(1, Tuning::default());
        assert!(!title.toggle_pause());
    }

    #[test]
    fn test_title_screens() {
        let mut state = GameState::new(1, Tuning::default());
        assert!(state.show_history());
        assert_eq!(state.phase, GamePhase::History);
        assert!(state.show_ranking());
        assert!(state.back_to_title());
        assert_eq!(state.phase, GamePhase::Title);

        let events = state.drain_events();
        assert_eq!(events.len(), 3);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_dodge_input_without_obstacle_is_noop() {
        let mut state = running();
        assert!(!state.on_dodge_input(None));
        assert!(!state.player.dodge_queued);
        assert!(state.player.cut_in.is_none());
        assert!(!state.on_duck_input(None));
    }

    #[test]
    fn test_items() {
        let mut state = running();
        assert!(!state.use_item(ItemKind::Treat));
        state.player.lives = 1.5;
        assert!(state.use_item(ItemKind::Treat));
        assert_eq!(state.player.lives, 2.5);

        assert!(state.use_item(ItemKind::Shield));
        assert!(!state.use_item(ItemKind::Shield));
    }

    #[test]
    fn test_identity_storage_key() {
        let guest = Identity::default();
        assert_eq!(guest.storage_key(), "guest");
        assert!(!guest.is_identified());

        let user = Identity {
            username: Some("pip".into()),
            wallet_address: Some("0xabc".into()),
        };
        assert_eq!(user.storage_key(), "0xabc");
        assert!(user.is_identified());
    }

    #[test]
    fn test_day_time_wraps() {
        let mut state = running();
        state.score.distance = 1250.0;
        let snap = state.snapshot();
        assert!((snap.day_time - 0.25).abs() < 1e-5);
        assert_eq!(snap.player_animation, PlayerAnimation::Running);
        assert_eq!(snap.run.distance, 1250.0);
    }

    #[test]
    fn test_snapshot_publishes_boss_health_and_respawn() {
        let mut state = running();
        let tuning = state.tuning.clone();
        for _ in 0..4 {
            state.boss.register_hit(&tuning);
        }
        state.timers.start(TimerKind::BossRespawn, 2.5);

        let snap = state.snapshot();
        assert!((snap.boss_life - 0.6).abs() < 1e-5);
        assert_eq!(snap.boss_respawn_in, Some(2.5));

        // Run stats stay top-level for the scene graph
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["lives"], 3.0);
        assert!(json.get("run").is_none());
    }

    #[test]
    fn test_score_entry_identity() {
        let alice = Identity {
            username: Some("alice".into()),
            wallet_address: None,
        };
        let entry = ScoreEntry::new(10, 1.0, &alice);
        assert_eq!(entry.identity(), alice);
    }
}
