//! Per-frame simulation tick
//!
//! Runs once per rendered frame. Timers advance in every phase except
//! PAUSED; the subsystems only advance while RUNNING and always in the same
//! order: distance, obstacle, projectile. The projectile step therefore sees
//! the obstacle state written earlier in the same frame.

use glam::Vec2;

use super::boss::BossHit;
use super::state::{GameEvent, GamePhase, GameState, RunMode, ScoreEntry};
use super::timer::TimerKind;
use crate::consts::{LIFE_EPSILON, MAX_FRAME_DELTA, PROGRESS_AT_PLAYER};
use crate::inventory::ItemKind;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Dodge pressed this frame
    pub dodge: bool,
    /// Duck pressed this frame
    pub duck: bool,
    /// Normalized screen position of the dodge/duck input, if pointer-driven
    pub pointer: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Obstacle progress past which the autopilot queues its dodge
const DEMO_DODGE_PROGRESS: f32 = 0.5;

/// Advance the game by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DELTA);

    if input.pause {
        state.toggle_pause();
    }
    if input.dodge {
        state.on_dodge_input(input.pointer);
    }
    if input.duck {
        state.on_duck_input(input.pointer);
    }

    if state.phase == GamePhase::Paused {
        return;
    }

    advance_timers(state, dt);

    if state.phase != GamePhase::Running {
        return;
    }

    if state.mode == RunMode::Demo {
        autopilot(state);
    }

    update_distance(state, dt);
    obstacle_step(state, dt);
    // A hit may have ended the run
    if state.phase != GamePhase::Running {
        return;
    }
    projectile_step(state, dt);
}

fn advance_timers(state: &mut GameState, dt: f32) {
    let mut expired = Vec::new();
    state.timers.advance(dt, &mut expired);

    for kind in expired {
        match kind {
            TimerKind::HitFlag => state.player.clear_hit(),
            TimerKind::PlayerAction => state.player.end_action(),
            TimerKind::CutIn => state.player.clear_cut_in(),
            TimerKind::BossHitFlash => state.boss.hit_flash = false,
            TimerKind::SpawnFreeze => {}
            TimerKind::BossRespawn => {
                state.boss.advance(&state.tuning);
                log::info!("Boss arrives: {:?} level {}", state.boss.boss_type, state.boss.level);
                state.emit(GameEvent::BossArrived {
                    boss: state.boss.boss_type,
                    level: state.boss.level,
                });
            }
            TimerKind::ProjectileRelease => {
                if let Some(kind) = state.projectiles.release(&mut state.rng, &state.tuning) {
                    state.emit(GameEvent::ProjectileReleased { kind });
                }
            }
            TimerKind::CaughtDelay | TimerKind::ClearDelay => finish_run(state),
        }
    }
}

/// Demo runs queue their own dodges and ducks
fn autopilot(state: &mut GameState) {
    if state.obstacles.is_active()
        && !state.player.dodge_queued
        && state.obstacles.progress() > DEMO_DODGE_PROGRESS
    {
        state.on_dodge_input(None);
    }
    if state.projectiles.is_active() && !state.player.duck_queued {
        state.on_duck_input(None);
    }
}

fn update_distance(state: &mut GameState, dt: f32) {
    let raw = state.score.speed * dt * state.tuning.meters_per_speed_second;
    let update = state.score.update_distance(raw, &state.tuning);
    if update.speed_steps > 0 {
        log::debug!("Speed up to {:.2}", state.score.speed);
        state.emit(GameEvent::SpeedUp {
            speed: state.score.speed,
        });
    }
}

fn spawning_frozen(state: &GameState) -> bool {
    state.boss.defeated || state.timers.is_pending(TimerKind::SpawnFreeze)
}

fn obstacle_step(state: &mut GameState, dt: f32) {
    let spawn_allowed = state.projectiles.is_idle() && !spawning_frozen(state);
    let speed = state.score.speed;
    let result = state
        .obstacles
        .tick(dt, speed, spawn_allowed, &mut state.rng, &state.tuning);

    if let Some(spawn) = result.spawned {
        state.emit(GameEvent::ObstacleSpawned(spawn));
    }
    if result.expired {
        state.player.dodge_queued = false;
        state.emit(GameEvent::ObstacleExpired);
        return;
    }
    if !result.active {
        return;
    }

    // Late dodge window; never while stunned
    if state.player.dodge_queued
        && !state.obstacles.dodged
        && !state.player.hit
        && state.obstacles.approach.beyond(state.tuning.dodge_window)
    {
        let kind = state.obstacles.kind;
        let combo = state.player.perform_dodge(kind, &mut state.rng);
        let points = award(state, combo);
        state.obstacles.dodged = true;
        state
            .timers
            .start(TimerKind::PlayerAction, state.tuning.dodge_duration);
        log::debug!("Dodged {:?} (combo {})", kind, combo);
        state.emit(GameEvent::Dodged { kind, combo, points });
    }

    let progress = state.obstacles.progress();
    if state.obstacles.dodged {
        let boss_at = state.boss.position(state.player.lives, &state.tuning);
        if progress >= boss_at && !state.boss.defeated {
            state.obstacles.deactivate();
            state.player.dodge_queued = false;
            hit_boss(state);
        }
    } else if progress >= PROGRESS_AT_PLAYER {
        state.obstacles.deactivate();
        state.player.dodge_queued = false;
        hit_player(state);
    }
}

fn projectile_step(state: &mut GameState, dt: f32) {
    let spawn_allowed = !state.obstacles.is_active() && !spawning_frozen(state);
    if state.projectiles.check_spawn(dt, spawn_allowed) {
        let boss = state.boss.boss_type;
        state
            .projectiles
            .trigger_throw(state.player.lives, boss, &mut state.rng, &state.tuning);
        state
            .timers
            .start(TimerKind::ProjectileRelease, state.tuning.throw_windup);
        state.emit(GameEvent::ThrowStarted { boss });
    }

    let speed = state.score.speed;
    let level = state.boss.level;
    let result = state.projectiles.tick(dt, speed, level, &state.tuning);

    // Resolve on the finishing frame too, so a long frame cannot skip the window
    if (result.active || result.finished)
        && state.player.duck_queued
        && !state.projectiles.ducked
        && result.progress > state.tuning.duck_window
    {
        state.player.perform_duck();
        let combo = state.player.combo();
        let points = award(state, combo);
        state.projectiles.ducked = true;
        state
            .timers
            .start(TimerKind::PlayerAction, state.tuning.dodge_duration);
        let kind = state.projectiles.kind;
        log::debug!("Ducked {:?} (combo {})", kind, combo);
        state.emit(GameEvent::Ducked { kind, combo, points });
    }

    if result.finished {
        state.player.duck_queued = false;
        if !state.projectiles.ducked {
            hit_player(state);
        }
    }
}

/// Score a resolved dodge/duck, returning the points awarded
fn award(state: &mut GameState, combo: u32) -> u64 {
    let points = state.tuning.dodge_points(combo);
    let before = state.score.score;
    state.score.add_score(points);
    state.score.score - before
}

/// An unresolved hazard reached the player
fn hit_player(state: &mut GameState) {
    if state.player.invulnerable {
        return;
    }

    if state.player.absorb_hit() {
        state.timers.start(TimerKind::HitFlag, state.tuning.hit_duration);
        state.emit(GameEvent::PlayerHit {
            lives: state.player.lives,
            shielded: true,
        });
        return;
    }

    let remaining = state.player.take_damage();
    state.timers.start(TimerKind::HitFlag, state.tuning.hit_duration);
    log::debug!("Player hit, {:.1} lives left", remaining);
    state.emit(GameEvent::PlayerHit {
        lives: remaining,
        shielded: false,
    });

    if remaining <= LIFE_EPSILON {
        end_run_caught(state);
    }
}

/// A dodged obstacle reached the boss
fn hit_boss(state: &mut GameState) {
    let outcome = state.boss.register_hit(&state.tuning);
    if outcome == BossHit::Ignored {
        return;
    }

    state.player.heal(state.tuning.boss_hit_heal);
    state.boss.hit_flash = true;
    state
        .timers
        .start(TimerKind::BossHitFlash, state.tuning.boss_hit_flash);
    state.emit(GameEvent::BossHit {
        hits_taken: state.boss.hits_taken,
    });

    if let BossHit::Defeated { terminal } = outcome {
        defeat_boss(state, terminal);
    }
}

fn clear_hazards(state: &mut GameState) {
    state.obstacles.clear(&mut state.rng, &state.tuning);
    state.projectiles.clear(&mut state.rng, &state.tuning);
    state.timers.cancel(TimerKind::ProjectileRelease);
    state.player.clear_queues();
}

fn defeat_boss(state: &mut GameState, terminal: bool) {
    clear_hazards(state);

    let bonus = if terminal {
        state.tuning.game_clear_bonus
    } else {
        state.tuning.boss_defeat_bonus
    };
    let before = state.score.score;
    state.score.add_score(bonus);
    let boss = state.boss.boss_type;
    let level = state.boss.level;
    log::info!("Boss defeated: {:?} level {} (terminal: {})", boss, level, terminal);
    state.emit(GameEvent::BossDefeated {
        boss,
        level,
        terminal,
        bonus: state.score.score - before,
    });

    if terminal {
        clear_game(state);
        return;
    }

    state.timers.start(TimerKind::SpawnFreeze, state.tuning.spawn_freeze);
    state
        .timers
        .start(TimerKind::BossRespawn, state.tuning.boss_respawn_delay);
    state.emit(GameEvent::ItemGranted {
        kind: ItemKind::Treat,
        quantity: 1,
    });
}

/// RUNNING -> CAUGHT_ANIMATION. Returns false if the run was already ending.
pub(crate) fn end_run_caught(state: &mut GameState) -> bool {
    if state.game_ended {
        return false;
    }
    state.game_ended = true;
    clear_hazards(state);
    state.set_phase(GamePhase::CaughtAnimation);
    state.timers.start(TimerKind::CaughtDelay, state.tuning.caught_delay);
    true
}

/// RUNNING -> GAME_CLEAR. Returns false if the run was already ending.
pub(crate) fn clear_game(state: &mut GameState) -> bool {
    if state.game_ended {
        return false;
    }
    state.game_ended = true;
    clear_hazards(state);
    state.set_phase(GamePhase::GameClear);
    state.timers.start(TimerKind::ClearDelay, state.tuning.clear_delay);
    true
}

/// Enter GAME_OVER and publish the run summary
fn finish_run(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.set_phase(GamePhase::GameOver);

    let score = state.score.score;
    let distance = state.score.distance;
    log::info!("Game over: score {} distance {:.0}m", score, distance);
    state.emit(GameEvent::GameOver { score, distance });

    if score > 0 && state.mode == RunMode::Normal {
        let entry = ScoreEntry::new(score, distance, &state.identity);
        state.emit(GameEvent::RunCompleted(entry));
    }
}
