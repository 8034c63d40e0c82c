use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::ScanError;

/// Delays governing the scan session state machine
#[derive(Debug, Clone, Copy)]
pub struct ScanTimings {
    /// How long the camera waits for a real detection before the demo
    /// fallback fires
    pub detection_timeout: Duration,
    /// How long the "scanned" confirmation is shown while the product is
    /// resolved
    pub settle_delay: Duration,
    /// Delay between a successful credit and the leave-view request
    pub exit_delay: Duration,
}

impl Default for ScanTimings {
    fn default() -> Self {
        Self {
            detection_timeout: Duration::from_secs(3),
            settle_delay: Duration::from_secs(2),
            exit_delay: Duration::from_millis(1500),
        }
    }
}

/// Request payload for a manual barcode entry
#[derive(Debug, Deserialize)]
pub struct ManualScanRequest {
    pub user_id: String,
    pub barcode: String,
}

/// Request payload for starting a camera scan session
#[derive(Debug, Deserialize)]
pub struct CameraScanRequest {
    pub user_id: String,
}

/// What the user is shown after a successful credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummary {
    pub product_name: String,
    pub barcode: String,
    pub overall_score: i32,
    pub synthetic: bool,
    pub points_earned: i32,
    pub eco_score: i64,
    pub total_scans: i64,
}

/// Terminal result of a scan session
#[derive(Debug)]
pub enum SessionOutcome {
    Settled(CreditSummary),
    Cancelled,
    Failed(ScanError),
}

/// Response for scan endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub session_id: String,
    pub status: String,
    pub credit: Option<CreditSummary>,
}
