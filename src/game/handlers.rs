use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    service::{ActionOutcome, MatchStats, MatchView},
    types::{ActionRequest, MatchSummaryResponse, StartMatchRequest},
};
use crate::persistence::{MatchRecord, MatchRepository};
use crate::shared::{AppError, AppState};

/// GET /match
#[instrument(name = "get_match", skip(state))]
pub async fn get_match(State(state): State<AppState>) -> Json<MatchView> {
    Json(state.match_service.view().await)
}

/// HTTP handler for starting a match
///
/// POST /match/start
/// Returns the new match view, or `applied: false` while a match is running
#[instrument(name = "start_match", skip(state))]
pub async fn start_match(
    State(state): State<AppState>,
    Json(request): Json<StartMatchRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    info!(
        player1 = %request.player1.name,
        player2 = %request.player2.name,
        "Starting match"
    );

    let outcome = state
        .match_service
        .start_game(request.player1, request.player2, request.target_goal)
        .await?;

    Ok(Json(outcome))
}

/// HTTP handler for scoring actions
///
/// POST /match/actions
/// Out-of-turn or invalid actions come back with `applied: false` and a 200
#[instrument(name = "apply_action", skip(state))]
pub async fn apply_action(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Json<ActionOutcome> {
    Json(
        state
            .match_service
            .apply(request.player, request.action)
            .await,
    )
}

/// POST /match/clock/pause
#[instrument(name = "pause_clock", skip(state))]
pub async fn pause_clock(State(state): State<AppState>) -> Json<ActionOutcome> {
    Json(state.match_service.pause_clock().await)
}

/// POST /match/clock/resume
#[instrument(name = "resume_clock", skip(state))]
pub async fn resume_clock(State(state): State<AppState>) -> Json<ActionOutcome> {
    Json(state.match_service.resume_clock().await)
}

/// POST /match/reset
#[instrument(name = "reset_match", skip(state))]
pub async fn reset_match(State(state): State<AppState>) -> Json<MatchView> {
    info!("Resetting match");
    Json(state.match_service.reset().await)
}

/// GET /match/stats
#[instrument(name = "match_stats", skip(state))]
pub async fn match_stats(State(state): State<AppState>) -> Json<MatchStats> {
    Json(state.match_service.stats().await)
}

/// HTTP handler for listing finished matches
///
/// GET /matches
/// Most recent first
#[instrument(name = "list_matches", skip(state))]
pub async fn list_matches(
    State(state): State<AppState>,
) -> Result<Json<Vec<MatchSummaryResponse>>, AppError> {
    let records = state.match_repository.list_matches().await?;
    info!(match_count = records.len(), "Matches listed successfully");

    Ok(Json(records.iter().map(MatchSummaryResponse::from).collect()))
}

/// GET /matches/:match_id
#[instrument(name = "get_finished_match", skip(state))]
pub async fn get_finished_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchRecord>, AppError> {
    state
        .match_repository
        .get_match(match_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
}
