// The ledger is the only history the match keeps. Runs, innings and every
// derived statistic are rebuilt from it, so entries are never edited in place.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use super::player::PlayerNumber;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
    Display,
)]
pub enum TurnAction {
    #[strum(to_string = "Points")]
    Points,
    #[strum(to_string = "Foul")]
    Foul,
    #[strum(to_string = "Safety")]
    Safety,
    #[strum(to_string = "Miss")]
    Miss,
    #[strum(to_string = "Scratch")]
    Scratch,
    #[strum(to_string = "Intentional Foul")]
    IntentionalFoul,
    #[strum(to_string = "Breaking Foul")]
    BreakingFoul,
    #[strum(to_string = "Breaking Foul - Rebreak")]
    BreakingFoulRebreak,
    #[strum(to_string = "Finish Rack")]
    FinishRack,
    #[strum(to_string = "Three Foul Penalty")]
    ThreeFoulPenalty,
    #[strum(to_string = "Handicap Applied")]
    HandicapApplied,
    #[strum(to_string = "Turn Passed")]
    TurnPassed,
}

impl TurnAction {
    /// Actions that can extend a run
    pub fn is_scoring(self) -> bool {
        matches!(self, TurnAction::Points | TurnAction::FinishRack)
    }

    /// Actions that end the shooter's run
    pub fn ends_run(self) -> bool {
        matches!(
            self,
            TurnAction::Miss
                | TurnAction::Safety
                | TurnAction::Foul
                | TurnAction::IntentionalFoul
                | TurnAction::BreakingFoul
                | TurnAction::BreakingFoulRebreak
                | TurnAction::Scratch
                | TurnAction::TurnPassed
        )
    }

    /// Actions that feed the consecutive foul window
    pub fn is_foul_class(self) -> bool {
        matches!(
            self,
            TurnAction::Foul
                | TurnAction::Scratch
                | TurnAction::IntentionalFoul
                | TurnAction::BreakingFoul
                | TurnAction::BreakingFoulRebreak
        )
    }

    /// Bookkeeping entries that are not shots taken at the table
    pub fn is_bookkeeping(self) -> bool {
        matches!(self, TurnAction::HandicapApplied)
    }
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub inning: u32,
    pub player_number: PlayerNumber,
    pub player_name: String,
    pub action: TurnAction,
    pub points: i32,
    pub timestamp: DateTime<Utc>,
    pub score_after: i32,
}

impl Turn {
    /// True when this entry extends a run: a positive `Points` entry or any `FinishRack`
    pub fn is_scoring_shot(&self) -> bool {
        match self.action {
            TurnAction::Points => self.points > 0,
            TurnAction::FinishRack => true,
            _ => false,
        }
    }

    /// True when this entry resets the shooter's run
    pub fn breaks_run(&self) -> bool {
        self.action.ends_run() || (self.action == TurnAction::Points && self.points <= 0)
    }
}

/// Append-only log of turns taken by either player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnLedger {
    entries: Vec<Turn>,
}

impl TurnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Turn>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, turn: Turn) {
        self.entries.push(turn);
    }

    /// Drops every entry appended after the first `len` entries
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn entries(&self) -> &[Turn] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.entries.last()
    }

    pub fn for_player(&self, player: PlayerNumber) -> impl Iterator<Item = &Turn> {
        self.entries
            .iter()
            .filter(move |turn| turn.player_number == player)
    }
}
