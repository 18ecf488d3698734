// Public API
pub use clock::{MatchClock, MAX_ELAPSED_MS};
pub use engine::{ActionRejected, ActionReport, PlayerAction, ScoringEngine};
pub use fouls::{FoulStreak, FOUL_WINDOW};
pub use handlers::{
    apply_action, get_finished_match, get_match, list_matches, match_stats, pause_clock,
    reset_match, resume_clock, start_match,
};
pub use ledger::{Turn, TurnAction, TurnLedger};
pub use player::{PlayerNumber, PlayerRecord, PlayerSeed};
pub use rules::RuleSet;
pub use service::{ActionOutcome, MatchService, MatchStats, MatchView};
pub use state::{MatchPhase, MatchState, DEFAULT_TARGET_GOAL, FULL_RACK};
pub use types::{ActionRequest, MatchSummaryResponse, StartMatchRequest};

// Internal modules
mod clock;
mod engine;
mod fouls;
mod handlers;
mod ledger;
mod player;
mod rules;
mod service;
mod state;
mod types;
mod undo;
