use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::session::ScanSession;
use super::types::{CameraScanRequest, ManualScanRequest, ScanResponse, SessionOutcome};
use crate::shared::{AppError, AppState};

fn build_session(state: &AppState, user_id: String) -> std::sync::Arc<ScanSession> {
    ScanSession::new(
        user_id,
        state.product_catalog.clone(),
        state.reward_ledger.clone(),
        state.detector.clone(),
        state.event_bus.clone(),
        state.scan_timings,
    )
}

fn outcome_to_response(
    session_id: String,
    outcome: SessionOutcome,
) -> Result<Json<ScanResponse>, AppError> {
    match outcome {
        SessionOutcome::Settled(credit) => Ok(Json(ScanResponse {
            session_id,
            status: "settled".to_string(),
            credit: Some(credit),
        })),
        SessionOutcome::Cancelled => Ok(Json(ScanResponse {
            session_id,
            status: "cancelled".to_string(),
            credit: None,
        })),
        SessionOutcome::Failed(error) => Err(error.into()),
    }
}

/// HTTP handler for a manual barcode entry
///
/// POST /scan/manual
/// Resolves the barcode against the catalog and credits the profile; an
/// unknown barcode is a 404 with no credit
#[instrument(name = "manual_scan", skip(state, request), fields(user_id = %request.user_id))]
pub async fn manual_scan(
    State(state): State<AppState>,
    Json(request): Json<ManualScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }
    if request.barcode.trim().is_empty() {
        return Err(AppError::BadRequest("barcode cannot be empty".to_string()));
    }

    let session = build_session(&state, request.user_id);
    let session_id = session.id().to_string();
    info!(session_id = %session_id, barcode = %request.barcode, "Manual scan started");

    let outcome = session.run_manual(&request.barcode).await;
    outcome_to_response(session_id, outcome)
}

/// HTTP handler for a camera scan session
///
/// POST /scan/camera
/// Runs the camera flow to completion and returns the outcome; the session
/// can be cancelled concurrently via DELETE /scan/:session_id
#[instrument(name = "camera_scan", skip(state, request), fields(user_id = %request.user_id))]
pub async fn camera_scan(
    State(state): State<AppState>,
    Json(request): Json<CameraScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id cannot be empty".to_string()));
    }

    let session = build_session(&state, request.user_id);
    let session_id = session.id().to_string();
    info!(session_id = %session_id, "Camera scan session started");

    let outcome_rx = state.session_manager.start_camera_session(session).await;
    let outcome = outcome_rx.await.map_err(|_| AppError::Internal)?;
    outcome_to_response(session_id, outcome)
}

/// HTTP handler for cancelling a running camera scan session
///
/// DELETE /scan/:session_id
/// Idempotent; cancelling an unknown or finished session succeeds
#[instrument(name = "cancel_scan", skip(state))]
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.session_manager.cancel(&session_id).await;
    Ok(StatusCode::NO_CONTENT)
}
