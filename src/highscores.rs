//! Ranking leaderboard
//!
//! Local top-10 table of completed runs, persisted next to the run history.
//! Identified players' runs are also pushed to a remote ranking store through
//! `RankingSink`, fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, load_json, save_json};
use crate::sim::ScoreEntry;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Remote ranking store boundary
pub trait RankingSink {
    /// Submit a run. Implementations must not block the caller on network
    /// latency.
    fn push(&mut self, entry: &ScoreEntry) -> Result<(), StoreError>;
}

/// Sink that drops everything (no remote store configured)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemote;

impl RankingSink for NoRemote {
    fn push(&mut self, _entry: &ScoreEntry) -> Result<(), StoreError> {
        Ok(())
    }
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "chihuahua_run_rankings";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_entry(&mut self, entry: ScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load rankings; unreadable data starts fresh
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<HighScores>(store, Self::STORAGE_KEY) {
            Ok(Some(scores)) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("High scores unreadable, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::Identity;

    fn entry(score: u64) -> ScoreEntry {
        ScoreEntry::new(score, 0.0, &Identity::default())
    }

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add_entry(entry(0)), None);
    }

    #[test]
    fn test_sorted_descending_and_capped() {
        let mut scores = HighScores::new();
        for s in [300, 100, 500, 200] {
            scores.add_entry(entry(s));
        }
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![500, 300, 200, 100]);

        for s in 1000..1010 {
            scores.add_entry(entry(s));
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1009));
        assert!(!scores.qualifies(50));
        assert_eq!(scores.add_entry(entry(50)), None);
    }

    #[test]
    fn test_rank_of_inserted_entry() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_entry(entry(500)), Some(1));
        assert_eq!(scores.add_entry(entry(100)), Some(2));
        assert_eq!(scores.add_entry(entry(300)), Some(2));
        // Ties rank below existing entries
        assert_eq!(scores.add_entry(entry(100)), Some(4));
    }

    #[test]
    fn test_persisted() {
        let mut store = MemoryStore::new();
        let mut scores = HighScores::new();
        scores.add_entry(entry(42));
        scores.save(&mut store).unwrap();
        assert_eq!(HighScores::load(&store).top_score(), Some(42));
    }
}
