//! Wallet-gated reward claims
//!
//! A claim is started by the player from GAME_OVER and completes whenever the
//! wallet call returns. The frame loop never waits on it: the UI polls
//! `RewardClaim::status` instead. A claim outlives the run it was made for:
//! starting another run while the wallet is still answering keeps it pending.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome shown to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl ClaimResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            tx_hash: None,
        }
    }
}

/// What the wallet collaborator is asked to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub wallet: String,
    pub score: u64,
}

/// Why a claim could not start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("connect a wallet to claim rewards")]
    NoWallet,
    #[error("nothing to claim for a zero score")]
    ZeroScore,
    #[error("demo runs cannot claim rewards")]
    DemoRun,
    #[error("the run is not over yet")]
    RunInProgress,
    #[error("a claim is already pending")]
    AlreadyPending,
    #[error("this run's reward was already claimed")]
    AlreadyClaimed,
}

/// Claim lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[default]
    Idle,
    Pending(ClaimRequest),
    Finished(ClaimResult),
}

/// Reward claim state
#[derive(Debug, Clone, Default)]
pub struct RewardClaim {
    status: ClaimStatus,
    /// Run the current status belongs to
    run: u64,
}

/// Run facts a claim is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimContext<'a> {
    /// Run counter, bumped on every start
    pub run: u64,
    pub wallet: Option<&'a str>,
    pub score: u64,
    pub demo: bool,
    pub game_over: bool,
}

impl RewardClaim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ClaimStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, ClaimStatus::Pending(_))
    }

    /// Validate and move to Pending. The returned request is handed to the
    /// wallet collaborator off the frame loop.
    pub fn begin(&mut self, ctx: ClaimContext<'_>) -> Result<ClaimRequest, ClaimError> {
        match &self.status {
            ClaimStatus::Pending(_) => return Err(ClaimError::AlreadyPending),
            ClaimStatus::Finished(result) if result.success && self.run == ctx.run => {
                return Err(ClaimError::AlreadyClaimed);
            }
            _ => {}
        }
        if !ctx.game_over {
            return Err(ClaimError::RunInProgress);
        }
        if ctx.demo {
            return Err(ClaimError::DemoRun);
        }
        if ctx.score == 0 {
            return Err(ClaimError::ZeroScore);
        }
        let wallet = ctx.wallet.ok_or(ClaimError::NoWallet)?;

        let request = ClaimRequest {
            wallet: wallet.to_string(),
            score: ctx.score,
        };
        self.status = ClaimStatus::Pending(request.clone());
        self.run = ctx.run;
        log::info!("Reward claim started for score {}", request.score);
        Ok(request)
    }

    /// Record the collaborator's answer. Transport errors become a failed,
    /// retryable result.
    pub fn finish(&mut self, outcome: Result<ClaimResult, String>) {
        if !self.is_pending() {
            log::warn!("Reward claim result arrived with no claim pending");
            return;
        }
        let result = outcome.unwrap_or_else(|e| {
            log::warn!("Reward claim failed: {}", e);
            ClaimResult::failure(e)
        });
        self.status = ClaimStatus::Finished(result);
    }

    /// Show a rejected claim as a failed result. A pending or successful
    /// claim is left alone.
    pub fn reject(&mut self, error: &ClaimError) {
        match &self.status {
            ClaimStatus::Pending(_) => {}
            ClaimStatus::Finished(result) if result.success => {}
            _ => self.status = ClaimStatus::Finished(ClaimResult::failure(error.to_string())),
        }
    }

    /// New run: forget the previous claim unless it is still in flight
    pub fn reset(&mut self) {
        if !self.is_pending() {
            self.status = ClaimStatus::Idle;
        }
    }
}
