use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of consecutive fouls that triggers the penalty
pub const FOUL_WINDOW: usize = 3;

/// Trailing window of the last foul/no-foul outcomes for one player.
///
/// Only foul-class actions push `true`. Scoring clears the window outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoulStreak {
    window: VecDeque<bool>,
}

impl FoulStreak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a foul. Returns `true` when this foul completes a streak of
    /// three; the window is cleared in that case.
    pub fn register_foul(&mut self) -> bool {
        self.window.push_back(true);
        if self.window.len() >= FOUL_WINDOW
            && self.window.iter().rev().take(FOUL_WINDOW).all(|foul| *foul)
        {
            self.window.clear();
            return true;
        }
        self.trim();
        false
    }

    /// Records a turn that ended without a foul
    pub fn register_clean_turn(&mut self) {
        self.window.push_back(false);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Count of trailing fouls in the window
    pub fn consecutive_fouls(&self) -> usize {
        self.window.iter().rev().take_while(|foul| **foul).count()
    }

    /// One more foul would incur the penalty
    pub fn is_on_warning(&self) -> bool {
        self.consecutive_fouls() == FOUL_WINDOW - 1
    }

    pub fn window(&self) -> &VecDeque<bool> {
        &self.window
    }

    /// Brings a restored window back to a shape live play can produce. A
    /// completed streak is never stored, so one is held at the warning.
    pub fn normalize(&mut self) {
        self.trim();
        if self.consecutive_fouls() >= FOUL_WINDOW {
            self.window.pop_front();
        }
    }

    fn trim(&mut self) {
        while self.window.len() > FOUL_WINDOW {
            self.window.pop_front();
        }
    }
}
