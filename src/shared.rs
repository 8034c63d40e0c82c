use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::repository::ProductCatalog;
use crate::event::EventBus;
use crate::ledger::repository::{ProfileStore, ScanEventStore};
use crate::ledger::service::RewardLedger;
use crate::ledger::LedgerError;
use crate::rewards::repository::RewardsCatalog;
use crate::scan::detector::Detector;
use crate::scan::manager::SessionManager;
use crate::scan::types::ScanTimings;
use crate::scan::ScanError;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub product_catalog: Arc<dyn ProductCatalog>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub scan_store: Arc<dyn ScanEventStore>,
    pub rewards_catalog: Arc<dyn RewardsCatalog>,
    pub reward_ledger: Arc<RewardLedger>,
    pub session_manager: Arc<SessionManager>,
    pub detector: Arc<dyn Detector>,
    pub event_bus: EventBus,
    pub scan_timings: ScanTimings,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProfileNotFound(user_id) => {
                // An authenticated user must always have a profile row, so a
                // miss here means a data-consistency bug upstream.
                tracing::error!(user_id = %user_id, "Credit attempted for missing profile");
                AppError::Internal
            }
            LedgerError::Conflict => {
                AppError::Conflict("Profile update conflicted, please retry".to_string())
            }
            LedgerError::ScanWrite(msg) => AppError::DatabaseError(msg),
            LedgerError::Storage(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::ProductNotFound { barcode } => {
                AppError::NotFound(format!("No product found for barcode {}", barcode))
            }
            ScanError::Ledger(ledger_err) => ledger_err.into(),
            ScanError::Catalog(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::catalog::repository::InMemoryProductCatalog;
    use crate::ledger::repository::{InMemoryProfileStore, InMemoryScanEventStore};
    use crate::rewards::repository::InMemoryRewardsCatalog;
    use crate::scan::detector::UnavailableDetector;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        product_catalog: Option<Arc<dyn ProductCatalog>>,
        profile_store: Option<Arc<dyn ProfileStore>>,
        scan_store: Option<Arc<dyn ScanEventStore>>,
        rewards_catalog: Option<Arc<dyn RewardsCatalog>>,
        detector: Option<Arc<dyn Detector>>,
        scan_timings: Option<ScanTimings>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                product_catalog: None,
                profile_store: None,
                scan_store: None,
                rewards_catalog: None,
                detector: None,
                scan_timings: None,
            }
        }

        pub fn with_product_catalog(mut self, catalog: Arc<dyn ProductCatalog>) -> Self {
            self.product_catalog = Some(catalog);
            self
        }

        pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
            self.profile_store = Some(store);
            self
        }

        pub fn with_scan_store(mut self, store: Arc<dyn ScanEventStore>) -> Self {
            self.scan_store = Some(store);
            self
        }

        pub fn with_rewards_catalog(mut self, catalog: Arc<dyn RewardsCatalog>) -> Self {
            self.rewards_catalog = Some(catalog);
            self
        }

        pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
            self.detector = Some(detector);
            self
        }

        pub fn with_scan_timings(mut self, timings: ScanTimings) -> Self {
            self.scan_timings = Some(timings);
            self
        }

        pub fn build(self) -> AppState {
            let product_catalog = self
                .product_catalog
                .unwrap_or_else(|| Arc::new(InMemoryProductCatalog::new()));
            let profile_store = self
                .profile_store
                .unwrap_or_else(|| Arc::new(InMemoryProfileStore::new()));
            let scan_store = self
                .scan_store
                .unwrap_or_else(|| Arc::new(InMemoryScanEventStore::new(product_catalog.clone())));
            let reward_ledger =
                Arc::new(RewardLedger::new(profile_store.clone(), scan_store.clone()));

            AppState {
                product_catalog,
                profile_store,
                scan_store,
                rewards_catalog: self
                    .rewards_catalog
                    .unwrap_or_else(|| Arc::new(InMemoryRewardsCatalog::new())),
                reward_ledger,
                session_manager: Arc::new(SessionManager::new()),
                detector: self
                    .detector
                    .unwrap_or_else(|| Arc::new(UnavailableDetector)),
                event_bus: EventBus::new(),
                scan_timings: self.scan_timings.unwrap_or_else(|| ScanTimings {
                    detection_timeout: std::time::Duration::from_millis(40),
                    settle_delay: std::time::Duration::from_millis(10),
                    exit_delay: std::time::Duration::from_millis(10),
                }),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
