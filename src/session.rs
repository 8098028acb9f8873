//! Host session
//!
//! Owns the game core and every collaborator around it. Each frame runs one
//! tick and then dispatches the events it produced: persistence, rankings
//! and inventory writes happen here, after the tick has returned. Collaborator
//! failures are logged and never reach the simulation.

use crate::highscores::{HighScores, RankingSink};
use crate::inventory::{Inventory, ItemKind};
use crate::persistence::{KeyValueStore, RunHistory};
use crate::rewards::{ClaimContext, ClaimError, ClaimRequest, ClaimResult, ClaimStatus, RewardClaim};
use crate::settings::Settings;
use crate::sim::{
    FrameSnapshot, GameEvent, GamePhase, GameState, Identity, RunMode, ScoreEntry, TickInput, tick,
};
use crate::tuning::Tuning;

/// One interactive session: the game plus its collaborators
pub struct Session {
    state: GameState,
    store: Box<dyn KeyValueStore>,
    ranking_sink: Box<dyn RankingSink>,
    settings: Settings,
    history: RunHistory,
    rankings: HighScores,
    inventory: Inventory,
    claim: RewardClaim,
    /// Bumped on every start; tags reward claims
    run: u64,
    /// Leaderboard rank of the last completed run
    last_rank: Option<usize>,
}

impl Session {
    pub fn new(
        seed: u64,
        tuning: Tuning,
        store: Box<dyn KeyValueStore>,
        ranking_sink: Box<dyn RankingSink>,
    ) -> Self {
        let settings = Settings::load(&*store);
        let history = RunHistory::load(&*store, &settings.identity);
        let rankings = HighScores::load(&*store);
        let inventory = Inventory::load(&*store, &settings.identity);
        Self {
            state: GameState::new(seed, tuning),
            store,
            ranking_sink,
            settings,
            history,
            rankings,
            inventory,
            claim: RewardClaim::new(),
            run: 0,
            last_rank: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    pub fn rankings(&self) -> &HighScores {
        &self.rankings
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Rank the last run reached, if it made the leaderboard
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn claim_status(&self) -> &ClaimStatus {
        self.claim.status()
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        self.state.snapshot()
    }

    /// Replace settings and persist them
    pub fn update_settings(&mut self, settings: Settings) {
        let identity_changed = settings.identity != self.settings.identity;
        self.settings = settings.sanitized();
        if let Err(e) = self.settings.save(&mut *self.store) {
            log::warn!("Failed to save settings: {}", e);
        }
        if identity_changed {
            self.reload_user_data();
        }
    }

    /// Switch player (login/logout, wallet connect)
    pub fn set_identity(&mut self, identity: Identity) {
        let mut settings = self.settings.clone();
        settings.identity = identity;
        self.update_settings(settings);
    }

    fn reload_user_data(&mut self) {
        let identity = &self.settings.identity;
        log::info!("Loading data for {}", identity.storage_key());
        self.history = RunHistory::load(&*self.store, identity);
        self.inventory = Inventory::load(&*self.store, identity);
    }

    /// Start (or restart) a run for the current identity
    pub fn start(&mut self, mode: RunMode) -> bool {
        if !self.state.start_game(mode, self.settings.identity.clone()) {
            return false;
        }
        self.run += 1;
        self.last_rank = None;
        self.claim.reset();
        true
    }

    pub fn show_history(&mut self) -> bool {
        self.state.show_history()
    }

    pub fn show_ranking(&mut self) -> bool {
        self.state.show_ranking()
    }

    pub fn back_to_title(&mut self) -> bool {
        self.state.back_to_title()
    }

    /// Pause a running game (tab hidden, focus lost)
    pub fn auto_pause(&mut self) -> bool {
        if self.state.phase != GamePhase::Running {
            return false;
        }
        log::info!("Auto-pausing");
        self.state.toggle_pause()
    }

    /// Advance one frame and dispatch its side effects
    pub fn frame(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        tick(&mut self.state, input, dt);
        let events = self.state.drain_events();
        for event in &events {
            match event {
                GameEvent::RunCompleted(entry) => self.record_run(entry),
                GameEvent::ItemGranted { kind, quantity } => self.grant_item(*kind, *quantity),
                _ => {}
            }
        }
        events
    }

    fn record_run(&mut self, entry: &ScoreEntry) {
        // History belongs to whoever played the run, not whoever is logged in now
        let owner = entry.identity();
        let saved = if owner == self.settings.identity {
            self.history.record(entry.clone());
            self.history.save(&mut *self.store, &owner)
        } else {
            let mut history = RunHistory::load(&*self.store, &owner);
            history.record(entry.clone());
            history.save(&mut *self.store, &owner)
        };
        if let Err(e) = saved {
            log::warn!("Failed to save run history: {}", e);
        }

        self.last_rank = self.rankings.add_entry(entry.clone());
        if let Some(rank) = self.last_rank {
            log::info!("New ranking #{} with {}", rank, entry.score);
            if let Err(e) = self.rankings.save(&mut *self.store) {
                log::warn!("Failed to save rankings: {}", e);
            }
        }

        if entry.is_identified() {
            if let Err(e) = self.ranking_sink.push(entry) {
                log::warn!("Failed to submit ranking: {}", e);
            }
        }
    }

    fn grant_item(&mut self, kind: ItemKind, quantity: u32) {
        self.inventory.grant(kind, quantity);
        log::info!("Granted {} x {:?}", quantity, kind);
        if let Err(e) = self.inventory.save(&mut *self.store, &self.settings.identity) {
            log::warn!("Failed to save inventory: {}", e);
        }
    }

    /// Use an item mid-run. The inventory is only charged if the core
    /// accepts it.
    pub fn use_item(&mut self, kind: ItemKind) -> bool {
        if !self.state.can_use_item(kind) || !self.inventory.consume(kind) {
            return false;
        }
        let applied = self.state.use_item(kind);
        if let Err(e) = self.inventory.save(&mut *self.store, &self.settings.identity) {
            log::warn!("Failed to save inventory: {}", e);
        }
        applied
    }

    /// Start a reward claim for the finished run
    pub fn begin_claim(&mut self) -> Result<ClaimRequest, ClaimError> {
        // The wallet may be connected on the GAME_OVER screen itself
        let ctx = ClaimContext {
            run: self.run,
            wallet: self.settings.identity.wallet_address.as_deref(),
            score: self.state.score.score,
            demo: self.state.mode == RunMode::Demo,
            game_over: self.state.phase == GamePhase::GameOver,
        };
        let result = self.claim.begin(ctx);
        if let Err(e) = &result {
            log::warn!("Reward claim rejected: {}", e);
            self.claim.reject(e);
        }
        result
    }

    /// Wallet collaborator answered
    pub fn finish_claim(&mut self, outcome: Result<ClaimResult, String>) {
        self.claim.finish(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::highscores::NoRemote;
    use crate::persistence::{MemoryStore, StoreError};
    use crate::sim::tick::{clear_game, end_run_caught};

    const DT: f32 = 1.0 / 60.0;

    /// Records pushed entries
    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Vec<ScoreEntry>>>);

    impl RankingSink for RecordingSink {
        fn push(&mut self, entry: &ScoreEntry) -> Result<(), StoreError> {
            self.0.borrow_mut().push(entry.clone());
            Ok(())
        }
    }

    /// Store whose writes always fail
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.to_string(),
                reason: "quota exceeded".into(),
            })
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn session() -> Session {
        Session::new(
            7,
            Tuning::default(),
            Box::new(MemoryStore::new()),
            Box::new(NoRemote),
        )
    }

    fn run_for(session: &mut Session, seconds: f32) {
        let steps = (seconds / DT).ceil() as usize;
        for _ in 0..steps {
            session.frame(&TickInput::default(), DT);
        }
    }

    /// Finish a run with the given score via the caught path
    fn finish_with(session: &mut Session, score: u64) {
        session.state.score.score = score;
        end_run_caught(&mut session.state);
        run_for(session, 3.1);
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    fn wallet() -> Identity {
        Identity {
            username: Some("alice".into()),
            wallet_address: Some("0xabc".into()),
        }
    }

    #[test]
    fn test_completed_run_recorded_and_ranked() {
        let mut session = session();
        assert!(session.start(RunMode::Normal));
        finish_with(&mut session, 900);

        assert_eq!(session.history().entries.len(), 1);
        assert_eq!(session.rankings().top_score(), Some(900));
        assert_eq!(session.last_rank(), Some(1));

        session.start(RunMode::Normal);
        assert_eq!(session.last_rank(), None);
        finish_with(&mut session, 0);
        assert_eq!(session.last_rank(), None);
    }

    #[test]
    fn test_history_kept_for_the_player_who_ran() {
        let mut session = session();
        session.set_identity(wallet());
        session.start(RunMode::Normal);

        let bob = Identity {
            username: Some("bob".into()),
            wallet_address: None,
        };
        session.set_identity(bob);
        finish_with(&mut session, 400);
        assert!(session.history().is_empty());

        session.set_identity(wallet());
        assert_eq!(session.history().entries.len(), 1);
        assert_eq!(session.history().entries[0].score, 400);
    }

    #[test]
    fn test_identified_run_pushed_to_sink() {
        let sink = RecordingSink::default();
        let pushed = sink.0.clone();
        let mut session = Session::new(
            1,
            Tuning::default(),
            Box::new(MemoryStore::new()),
            Box::new(sink),
        );

        session.start(RunMode::Normal);
        finish_with(&mut session, 100);
        assert!(pushed.borrow().is_empty());

        session.set_identity(wallet());
        session.start(RunMode::Normal);
        finish_with(&mut session, 200);
        assert_eq!(pushed.borrow().len(), 1);
        assert_eq!(pushed.borrow()[0].username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_demo_run_leaves_no_trace() {
        let mut session = session();
        session.start(RunMode::Demo);
        finish_with(&mut session, 5000);
        assert!(session.history().is_empty());
        assert!(session.rankings().is_empty());
        assert_eq!(session.begin_claim(), Err(ClaimError::DemoRun));
    }

    #[test]
    fn test_storage_failure_does_not_stop_run() {
        let mut session = Session::new(
            3,
            Tuning::default(),
            Box::new(FullStore),
            Box::new(NoRemote),
        );
        session.start(RunMode::Normal);
        finish_with(&mut session, 300);
        // Kept in memory even though saving failed
        assert_eq!(session.history().entries.len(), 1);
        assert!(session.start(RunMode::Normal));
    }

    #[test]
    fn test_item_used_only_when_applicable() {
        let mut session = session();
        session.inventory.grant(ItemKind::Treat, 1);

        // Not running yet
        assert!(!session.use_item(ItemKind::Treat));
        session.start(RunMode::Normal);

        // Full lives: the treat is kept
        assert!(!session.use_item(ItemKind::Treat));
        assert_eq!(session.inventory().quantity(ItemKind::Treat), 1);

        session.state.player.lives = 1.5;
        assert!(session.use_item(ItemKind::Treat));
        assert_eq!(session.state().player.lives, 2.5);
        assert_eq!(session.inventory().quantity(ItemKind::Treat), 0);
        assert!(!session.use_item(ItemKind::Treat));
    }

    #[test]
    fn test_granted_items_persist_per_user() {
        let mut session = session();
        session.set_identity(wallet());
        session.start(RunMode::Normal);
        session.state.emit(GameEvent::ItemGranted {
            kind: ItemKind::Treat,
            quantity: 1,
        });
        session.frame(&TickInput::default(), DT);
        assert_eq!(session.inventory().quantity(ItemKind::Treat), 1);

        session.set_identity(Identity::default());
        assert!(session.inventory().is_empty());
        session.set_identity(wallet());
        assert_eq!(session.inventory().quantity(ItemKind::Treat), 1);
    }

    #[test]
    fn test_claim_flow() {
        let mut session = session();
        session.set_identity(wallet());
        session.start(RunMode::Normal);
        assert_eq!(session.begin_claim(), Err(ClaimError::RunInProgress));
        assert!(matches!(
            session.claim_status(),
            ClaimStatus::Finished(ClaimResult { success: false, .. })
        ));

        session.state.score.score = 20_000;
        clear_game(&mut session.state);
        run_for(&mut session, 6.1);
        assert_eq!(session.phase(), GamePhase::GameOver);

        let request = session.begin_claim().unwrap();
        assert_eq!(request.wallet, "0xabc");
        assert_eq!(request.score, 20_000);

        // The frame loop keeps going while the claim is pending
        run_for(&mut session, 1.0);
        assert!(matches!(session.claim_status(), ClaimStatus::Pending(_)));

        session.finish_claim(Err("wallet rejected".into()));
        assert!(matches!(
            session.claim_status(),
            ClaimStatus::Finished(ClaimResult { success: false, .. })
        ));

        // Next run forgets the claim
        session.start(RunMode::Normal);
        assert_eq!(session.claim_status(), &ClaimStatus::Idle);
    }

    #[test]
    fn test_wallet_connected_after_run_can_claim() {
        let mut session = session();
        session.start(RunMode::Normal);
        finish_with(&mut session, 500);
        assert_eq!(session.begin_claim(), Err(ClaimError::NoWallet));

        session.set_identity(wallet());
        let request = session.begin_claim().unwrap();
        assert_eq!(request.wallet, "0xabc");
        assert_eq!(request.score, 500);
    }

    #[test]
    fn test_late_claim_result_survives_restart() {
        let mut session = session();
        session.set_identity(wallet());
        session.start(RunMode::Normal);
        finish_with(&mut session, 800);
        session.begin_claim().unwrap();

        session.start(RunMode::Normal);
        assert!(matches!(session.claim_status(), ClaimStatus::Pending(_)));
        session.finish_claim(Ok(ClaimResult {
            success: true,
            message: "Sent".into(),
            tx_hash: Some("0xdead".into()),
        }));
        match session.claim_status() {
            ClaimStatus::Finished(result) => {
                assert!(result.success);
                assert_eq!(result.tx_hash.as_deref(), Some("0xdead"));
            }
            other => panic!("expected finished claim, got {:?}", other),
        }

        // The new run earns its own claim
        finish_with(&mut session, 300);
        assert_eq!(session.begin_claim().unwrap().score, 300);
    }

    #[test]
    fn test_auto_pause_only_while_running() {
        let mut session = session();
        assert!(!session.auto_pause());
        session.start(RunMode::Normal);
        assert!(session.auto_pause());
        assert_eq!(session.phase(), GamePhase::Paused);
        assert!(!session.auto_pause());
    }
}
