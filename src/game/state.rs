use serde::{Deserialize, Serialize};

use super::player::PlayerNumber;

/// Object balls in a full rack
pub const FULL_RACK: u8 = 15;

pub const DEFAULT_TARGET_GOAL: i32 = 125;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPhase {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

/// Table-level state of the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchState {
    pub phase: MatchPhase,
    pub active_player: PlayerNumber,
    pub current_inning: u32,
    pub object_balls_on_table: u8,
    pub break_player: Option<PlayerNumber>,
    pub is_break_shot: bool,
    pub target_goal: i32,
    pub pending_breaking_foul: Option<PlayerNumber>,
    pub winner: Option<PlayerNumber>,
    /// Shooter who has held the table since the current rack was racked
    pub rack_held_by: Option<PlayerNumber>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            phase: MatchPhase::NotStarted,
            active_player: PlayerNumber::One,
            current_inning: 1,
            object_balls_on_table: FULL_RACK,
            break_player: None,
            is_break_shot: false,
            target_goal: DEFAULT_TARGET_GOAL,
            pending_breaking_foul: None,
            winner: None,
            rack_held_by: None,
        }
    }
}

impl MatchState {
    pub fn game_started(&self) -> bool {
        self.phase != MatchPhase::NotStarted
    }

    pub fn is_finished(&self) -> bool {
        self.phase == MatchPhase::Finished
    }

    /// Clamps values that cannot occur in a live match back into range
    pub fn normalize(&mut self) {
        if self.object_balls_on_table == 0 || self.object_balls_on_table > FULL_RACK {
            self.object_balls_on_table = FULL_RACK;
        }
        if self.current_inning == 0 {
            self.current_inning = 1;
        }
        if self.target_goal <= 0 {
            self.target_goal = DEFAULT_TARGET_GOAL;
        }
        if self.phase != MatchPhase::Finished {
            self.winner = None;
        }
    }
}
