//! Named single-slot timers
//!
//! Every delayed effect in a run (flag clears, respawns, phase changes) is a
//! timer keyed by `TimerKind`. Starting a timer cancels any pending timer of
//! the same kind, so a stale expiry can never clear a flag set by a later
//! event. Expiry is reported back to the owner, which dispatches the effect.

use serde::{Deserialize, Serialize};

/// Timer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Clears the player's hit-stun flag
    HitFlag,
    /// Clears the dodge/duck animation and invulnerability
    PlayerAction,
    /// Hides the comic cut-in
    CutIn,
    /// Clears the boss hit flash
    BossHitFlash,
    /// Brings the next boss level/type in after a defeat
    BossRespawn,
    /// Hazards may not spawn while pending
    SpawnFreeze,
    /// Ends the throw wind-up and releases the projectile
    ProjectileRelease,
    /// CAUGHT_ANIMATION -> GAME_OVER
    CaughtDelay,
    /// GAME_CLEAR -> GAME_OVER
    ClearDelay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Slot {
    kind: TimerKind,
    remaining: f32,
}

/// Set of pending timers, at most one per kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopedTimers {
    slots: Vec<Slot>,
}

impl ScopedTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for `kind`
    pub fn start(&mut self, kind: TimerKind, duration: f32) {
        let remaining = duration.max(0.0);
        match self.slots.iter_mut().find(|s| s.kind == kind) {
            Some(slot) => slot.remaining = remaining,
            None => self.slots.push(Slot { kind, remaining }),
        }
    }

    /// Cancel a pending timer. Returns true if one was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.kind != kind);
        self.slots.len() != before
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots.iter().any(|s| s.kind == kind)
    }

    /// Seconds left on a pending timer
    pub fn remaining(&self, kind: TimerKind) -> Option<f32> {
        self.slots.iter().find(|s| s.kind == kind).map(|s| s.remaining)
    }

    /// Cancel everything (new run)
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Advance all timers by `dt` seconds, appending expired kinds to
    /// `expired` in deadline order
    pub fn advance(&mut self, dt: f32, expired: &mut Vec<TimerKind>) {
        for slot in &mut self.slots {
            slot.remaining -= dt;
        }

        let mut fired: Vec<Slot> = self.slots.iter().copied().filter(|s| s.remaining <= 0.0).collect();
        if fired.is_empty() {
            return;
        }
        fired.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.slots.retain(|s| s.remaining > 0.0);
        expired.extend(fired.into_iter().map(|s| s.kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_expires_once() {
        let mut timers = ScopedTimers::new();
        timers.start(TimerKind::HitFlag, 1.5);

        let mut expired = Vec::new();
        timers.advance(1.0, &mut expired);
        assert!(expired.is_empty());
        assert!(timers.is_pending(TimerKind::HitFlag));

        timers.advance(0.6, &mut expired);
        assert_eq!(expired, vec![TimerKind::HitFlag]);
        assert!(!timers.is_pending(TimerKind::HitFlag));

        expired.clear();
        timers.advance(5.0, &mut expired);
        assert!(expired.is_empty());
    }

    #[test]
    fn test_restart_replaces_pending() {
        let mut timers = ScopedTimers::new();
        timers.start(TimerKind::CutIn, 0.8);

        let mut expired = Vec::new();
        timers.advance(0.7, &mut expired);
        // A new trigger before expiry pushes the deadline out
        timers.start(TimerKind::CutIn, 0.8);
        timers.advance(0.2, &mut expired);
        assert!(expired.is_empty());

        timers.advance(0.6, &mut expired);
        assert_eq!(expired, vec![TimerKind::CutIn]);
    }

    #[test]
    fn test_expiry_order_follows_deadline() {
        let mut timers = ScopedTimers::new();
        timers.start(TimerKind::ClearDelay, 0.3);
        timers.start(TimerKind::HitFlag, 0.1);
        timers.start(TimerKind::BossRespawn, 0.2);

        let mut expired = Vec::new();
        timers.advance(1.0, &mut expired);
        assert_eq!(
            expired,
            vec![TimerKind::HitFlag, TimerKind::BossRespawn, TimerKind::ClearDelay]
        );
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut timers = ScopedTimers::new();
        timers.start(TimerKind::SpawnFreeze, 3.0);
        timers.start(TimerKind::CaughtDelay, 3.0);
        assert!(timers.cancel(TimerKind::SpawnFreeze));
        assert!(!timers.cancel(TimerKind::SpawnFreeze));

        timers.clear();
        let mut expired = Vec::new();
        timers.advance(10.0, &mut expired);
        assert!(expired.is_empty());
    }
}
