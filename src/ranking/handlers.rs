use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::service::RankingService;
use super::types::{DashboardView, LeaderboardView};
use crate::shared::{AppError, AppState};

fn ranking_service(state: &AppState) -> RankingService {
    RankingService::new(
        Arc::clone(&state.profile_store),
        Arc::clone(&state.scan_store),
        Arc::clone(&state.rewards_catalog),
    )
}

/// HTTP handler for the leaderboard view
///
/// GET /leaderboard/:user_id
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<LeaderboardView>, AppError> {
    let view = ranking_service(&state).leaderboard(&user_id).await?;

    info!(
        user_id = %user_id,
        rank = ?view.your_rank,
        total_users = view.total_users,
        "Leaderboard served"
    );
    Ok(Json(view))
}

/// HTTP handler for the dashboard view
///
/// GET /dashboard/:user_id
#[instrument(name = "get_dashboard", skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardView>, AppError> {
    let view = ranking_service(&state).dashboard(&user_id, Utc::now()).await?;

    info!(user_id = %user_id, rank = ?view.rank, "Dashboard served");
    Ok(Json(view))
}
