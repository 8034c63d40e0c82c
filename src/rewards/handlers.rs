use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::models::{Challenge, RewardStatus};
use super::repository::RewardsCatalog;
use crate::ledger::repository::ProfileStore;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing active challenges
///
/// GET /challenges
#[instrument(name = "list_challenges", skip(state))]
pub async fn list_challenges(
    State(state): State<AppState>,
) -> Result<Json<Vec<Challenge>>, AppError> {
    let challenges = state.rewards_catalog.list_active_challenges(100).await?;

    info!(challenge_count = challenges.len(), "Challenges listed");
    Ok(Json(challenges))
}

/// HTTP handler for listing rewards annotated with redeemability for a user
///
/// GET /rewards/:user_id
#[instrument(name = "list_rewards_for_user", skip(state))]
pub async fn list_rewards_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RewardStatus>>, AppError> {
    let profile = state
        .profile_store
        .get_profile(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No profile for user {}", user_id)))?;

    let rewards = state.rewards_catalog.list_rewards().await?;
    let statuses: Vec<RewardStatus> = rewards
        .into_iter()
        .map(|reward| RewardStatus::for_score(reward, profile.eco_score))
        .collect();

    info!(
        user_id = %user_id,
        reward_count = statuses.len(),
        "Rewards listed with redeemability"
    );
    Ok(Json(statuses))
}
