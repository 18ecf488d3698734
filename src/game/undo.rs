use super::{fouls::FoulStreak, player::PlayerNumber, player::PlayerRecord};

/// State captured before every mutating action.
///
/// `ledger_len` pairs the snapshot with the ledger: undo truncates back to it,
/// so a foul and the penalty it triggered come off together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoSnapshot {
    pub players: [PlayerRecord; 2],
    pub active_player: PlayerNumber,
    pub current_inning: u32,
    pub object_balls_on_table: u8,
    pub break_player: Option<PlayerNumber>,
    pub is_break_shot: bool,
    pub rack_held_by: Option<PlayerNumber>,
    pub foul_streaks: [FoulStreak; 2],
    pub ledger_len: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    snapshots: Vec<UndoSnapshot>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: UndoSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn pop(&mut self) -> Option<UndoSnapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
