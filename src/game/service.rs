use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use super::{
    engine::{ActionRejected, ActionReport, PlayerAction, ScoringEngine},
    ledger::Turn,
    player::{PlayerNumber, PlayerRecord, PlayerSeed},
    rules::RuleSet,
    state::MatchState,
};
use crate::persistence::{MatchRecord, MatchRepository, PersistedMatch, SnapshotSaver};
use crate::shared::AppError;
use crate::stats::{player_stats, PlayerMatchStats};

/// Everything a scoreboard needs to draw the current match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub state: MatchState,
    pub players: [PlayerRecord; 2],
    pub ledger: Vec<Turn>,
    pub consecutive_fouls: [usize; 2],
    pub foul_warning: [bool; 2],
    pub elapsed_seconds: i64,
    pub is_timer_running: bool,
    pub can_undo: bool,
}

impl MatchView {
    fn of(engine: &ScoringEngine) -> Self {
        let streak = |player: PlayerNumber| engine.foul_streak(player);
        Self {
            state: engine.state().clone(),
            players: engine.players().clone(),
            ledger: engine.ledger().entries().to_vec(),
            consecutive_fouls: PlayerNumber::BOTH.map(|p| streak(p).consecutive_fouls()),
            foul_warning: PlayerNumber::BOTH.map(|p| streak(p).is_on_warning()),
            elapsed_seconds: engine.elapsed(Utc::now()).num_seconds(),
            is_timer_running: engine.clock().is_running(),
            can_undo: engine.undo_depth() > 0 || engine.state().pending_breaking_foul.is_some(),
        }
    }
}

/// Result of a scoring request. Rejected actions leave the match untouched
/// and are reported here rather than as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub applied: bool,
    pub report: Option<ActionReport>,
    pub rejected: Option<String>,
    pub view: MatchView,
}

impl ActionOutcome {
    fn new(result: Result<ActionReport, ActionRejected>, view: MatchView) -> Self {
        match result {
            Ok(report) => Self {
                applied: true,
                report: Some(report),
                rejected: None,
                view,
            },
            Err(reason) => Self {
                applied: false,
                report: None,
                rejected: Some(reason.to_string()),
                view,
            },
        }
    }
}

/// Per-player statistics projected from the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub player1: PlayerMatchStats,
    pub player2: PlayerMatchStats,
}

/// Hosts the single live match. Every mutation holds the engine lock for the
/// whole transition and then hands the settled state to the snapshot saver.
pub struct MatchService {
    engine: Mutex<ScoringEngine>,
    saver: SnapshotSaver,
    repository: Arc<dyn MatchRepository>,
}

impl MatchService {
    pub fn new(
        engine: ScoringEngine,
        saver: SnapshotSaver,
        repository: Arc<dyn MatchRepository>,
    ) -> Self {
        Self {
            engine: Mutex::new(engine),
            saver,
            repository,
        }
    }

    /// Resumes from a saved match, or starts from an empty table
    pub fn restore(
        rules: RuleSet,
        snapshot: Option<PersistedMatch>,
        saver: SnapshotSaver,
        repository: Arc<dyn MatchRepository>,
    ) -> Self {
        let engine = match snapshot {
            Some(snapshot) => {
                let engine = snapshot.into_engine(rules);
                info!(
                    phase = ?engine.state().phase,
                    entries = engine.ledger().len(),
                    "Restored match from snapshot"
                );
                engine
            }
            None => ScoringEngine::new(rules),
        };
        Self::new(engine, saver, repository)
    }

    pub async fn view(&self) -> MatchView {
        MatchView::of(&*self.engine.lock().await)
    }

    pub async fn stats(&self) -> MatchStats {
        let engine = self.engine.lock().await;
        let ledger = engine.ledger().entries();
        MatchStats {
            player1: player_stats(ledger, PlayerNumber::One),
            player2: player_stats(ledger, PlayerNumber::Two),
        }
    }

    /// Starts a match. Falls back to the configured target when none is given.
    #[instrument(skip(self))]
    pub async fn start_game(
        &self,
        player1: PlayerSeed,
        player2: PlayerSeed,
        target_goal: Option<i32>,
    ) -> Result<ActionOutcome, AppError> {
        if let Some(goal) = target_goal.filter(|goal| *goal <= 0) {
            return Err(AppError::BadRequest(format!(
                "Target goal must be positive, got {}",
                goal
            )));
        }
        let player1 = with_default_name(player1, PlayerNumber::One);
        let player2 = with_default_name(player2, PlayerNumber::Two);

        let mut engine = self.engine.lock().await;
        let goal = target_goal.unwrap_or(engine.rules().default_target_goal);
        let result = engine.start_game(player1, player2, goal);
        Ok(self.settle(&engine, result))
    }

    #[instrument(skip(self))]
    pub async fn apply(&self, player: PlayerNumber, action: PlayerAction) -> ActionOutcome {
        let (outcome, record) = {
            let mut engine = self.engine.lock().await;
            let result = engine.apply(player, action);
            let record = match &result {
                Ok(report) if report.winner.is_some() => {
                    MatchRecord::from_engine(&engine, Utc::now())
                }
                _ => None,
            };
            (self.settle(&engine, result), record)
        };

        if let Some(record) = record {
            self.submit(record).await;
        }
        outcome
    }

    pub async fn pause_clock(&self) -> ActionOutcome {
        let mut engine = self.engine.lock().await;
        let result = engine.pause_clock().map(|_| ActionReport::default());
        self.settle(&engine, result)
    }

    pub async fn resume_clock(&self) -> ActionOutcome {
        let mut engine = self.engine.lock().await;
        let result = engine.resume_clock().map(|_| ActionReport::default());
        self.settle(&engine, result)
    }

    /// Clears the match and the stored snapshot. Names and handicaps stay.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> MatchView {
        let mut engine = self.engine.lock().await;
        engine.reset();
        self.saver.clear();
        MatchView::of(&engine)
    }

    /// Waits until the latest snapshot has been written
    pub async fn flush(&self) {
        self.saver.flush().await;
    }

    fn settle(
        &self,
        engine: &ScoringEngine,
        result: Result<ActionReport, ActionRejected>,
    ) -> ActionOutcome {
        match &result {
            Ok(_) => self.saver.schedule(PersistedMatch::capture(engine)),
            Err(reason) => debug!(reason = %reason, "Action ignored"),
        }
        ActionOutcome::new(result, MatchView::of(engine))
    }

    async fn submit(&self, record: MatchRecord) {
        let match_id = record.match_id;
        match self.repository.submit_match(&record).await {
            Ok(()) => info!(
                match_id = %match_id,
                winner = %record.winner_name,
                duration_seconds = record.duration_seconds,
                "Match submitted"
            ),
            Err(e) => error!(match_id = %match_id, error = %e, "Failed to submit match"),
        }
    }
}

fn with_default_name(mut seed: PlayerSeed, player: PlayerNumber) -> PlayerSeed {
    let trimmed = seed.name.trim();
    seed.name = if trimmed.is_empty() {
        format!("Player {}", player)
    } else {
        trimmed.to_string()
    };
    seed
}
