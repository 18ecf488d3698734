// Library crate for the straight pool scorekeeper
// This file exposes the public API for the server binary and integration tests

pub mod config;
pub mod game;
pub mod persistence;
pub mod shared;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, ConfigError};
pub use game::{MatchService, PlayerAction, PlayerNumber, PlayerSeed, RuleSet, ScoringEngine};
pub use shared::{AppError, AppState};

/// Builds the HTTP router over the shared application state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/match", get(game::get_match))
        .route("/match/start", post(game::start_match))
        .route("/match/actions", post(game::apply_action))
        .route("/match/clock/pause", post(game::pause_clock))
        .route("/match/clock/resume", post(game::resume_clock))
        .route("/match/reset", post(game::reset_match))
        .route("/match/stats", get(game::match_stats))
        .route("/matches", get(game::list_matches))
        .route("/matches/:match_id", get(game::get_finished_match))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
