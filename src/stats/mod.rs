// Statistics derived from the turn ledger

// Public API
pub use aggregator::{best_run, final_score, innings_played, player_stats, turn_groups};
pub use models::{ActionMark, PlayerMatchStats, TurnGroup};

// Internal modules
mod aggregator;
mod models;
