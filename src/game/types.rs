use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::PlayerAction;
use super::player::{PlayerNumber, PlayerSeed};
use crate::persistence::MatchRecord;

/// Request payload for starting a match
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMatchRequest {
    pub player1: PlayerSeed,
    pub player2: PlayerSeed,
    /// Configured default applies when omitted
    #[serde(default)]
    pub target_goal: Option<i32>,
}

/// Request payload for a scoring action
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub player: PlayerNumber,
    pub action: PlayerAction,
}

/// One row in the finished-match listing
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummaryResponse {
    pub match_id: Uuid,
    pub player1_name: String,
    pub player2_name: String,
    pub player1_final_score: i32,
    pub player2_final_score: i32,
    pub winner_name: String,
    pub target_score: i32,
    pub duration_seconds: i64,
    pub completed_at: DateTime<Utc>,
}

impl From<&MatchRecord> for MatchSummaryResponse {
    fn from(record: &MatchRecord) -> Self {
        Self {
            match_id: record.match_id,
            player1_name: record.player1.name.clone(),
            player2_name: record.player2.name.clone(),
            player1_final_score: record.player1_final_score,
            player2_final_score: record.player2_final_score,
            winner_name: record.winner_name.clone(),
            target_score: record.target_score,
            duration_seconds: record.duration_seconds,
            completed_at: record.completed_at,
        }
    }
}
