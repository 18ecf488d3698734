use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::{PlayerNumber, Turn, TurnAction};

/// Where a non-scoring event happened and what it cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMark {
    pub inning: u32,
    pub points: i32,
}

/// Contiguous scoring shots taken in one visit to the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnGroup {
    pub inning: u32,
    pub points: i32,
    pub shots: Vec<Turn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStats {
    pub player_number: PlayerNumber,
    pub best_run: u32,
    pub total_score: i32,
    pub total_innings: u32,
    pub avg_points_per_inning: f64,
    pub action_counts: BTreeMap<TurnAction, u32>,
    pub safeties: Vec<ActionMark>,
    pub misses: Vec<ActionMark>,
    pub scratches: Vec<ActionMark>,
    pub fouls: Vec<ActionMark>,
    pub intentional_fouls: Vec<ActionMark>,
    pub breaking_fouls: Vec<ActionMark>,
    pub finished_racks: Vec<ActionMark>,
    pub turn_groups: Vec<TurnGroup>,
}

impl PlayerMatchStats {
    pub fn count(&self, action: TurnAction) -> u32 {
        self.action_counts.get(&action).copied().unwrap_or_default()
    }
}
