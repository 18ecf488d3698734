use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{PlayerNumber, PlayerRecord, ScoringEngine, Turn, TurnAction};
use crate::stats::{player_stats, PlayerMatchStats};

/// One side of a finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub name: String,
    pub handicap: i32,
    pub record: PlayerRecord,
    pub stats: PlayerMatchStats,
}

/// Ledger entry with its classification spelled out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTurn {
    #[serde(flatten)]
    pub turn: Turn,
    pub action_label: String,
    pub is_scratch: bool,
    pub is_safety_play: bool,
    pub is_foul: bool,
    pub is_breaking_foul: bool,
    pub is_intentional_foul: bool,
    pub is_miss: bool,
}

impl From<&Turn> for ProcessedTurn {
    fn from(turn: &Turn) -> Self {
        let action = turn.action;
        Self {
            turn: turn.clone(),
            action_label: action.to_string(),
            is_scratch: action == TurnAction::Scratch,
            is_safety_play: action == TurnAction::Safety,
            is_foul: action.is_foul_class(),
            is_breaking_foul: matches!(
                action,
                TurnAction::BreakingFoul | TurnAction::BreakingFoulRebreak
            ),
            is_intentional_foul: action == TurnAction::IntentionalFoul,
            is_miss: action == TurnAction::Miss,
        }
    }
}

/// Final record of a completed match, handed to the match repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_id: Uuid,
    pub player1: PlayerSummary,
    pub player2: PlayerSummary,
    pub turns: Vec<ProcessedTurn>,
    pub player1_final_score: i32,
    pub player2_final_score: i32,
    pub winner: PlayerNumber,
    pub winner_name: String,
    pub duration_seconds: i64,
    pub target_score: i32,
    pub completed_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Builds the record for a won match. Returns `None` while nobody has won.
    pub fn from_engine(engine: &ScoringEngine, now: DateTime<Utc>) -> Option<Self> {
        let winner = engine.state().winner?;
        let ledger = engine.ledger().entries();

        let summary = |player: PlayerNumber| {
            let record = engine.player(player).clone();
            PlayerSummary {
                name: record.name.clone(),
                handicap: record.handicap,
                stats: player_stats(ledger, player),
                record,
            }
        };

        Some(Self {
            match_id: Uuid::new_v4(),
            player1: summary(PlayerNumber::One),
            player2: summary(PlayerNumber::Two),
            turns: ledger.iter().map(ProcessedTurn::from).collect(),
            player1_final_score: engine.player(PlayerNumber::One).score,
            player2_final_score: engine.player(PlayerNumber::Two).score,
            winner,
            winner_name: engine.player(winner).name.clone(),
            duration_seconds: engine.elapsed(now).num_seconds(),
            target_score: engine.state().target_goal,
            completed_at: now,
        })
    }

    pub fn summary(&self, player: PlayerNumber) -> &PlayerSummary {
        match player {
            PlayerNumber::One => &self.player1,
            PlayerNumber::Two => &self.player2,
        }
    }
}
