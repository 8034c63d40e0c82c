use serde::{Deserialize, Serialize};

use crate::scan::session::ScanState;

/// Events that can occur over the lifetime of a scan session
///
/// Events represent facts about things that have already happened.
/// They are used to communicate session progress to observers (HTTP
/// handlers, tests, future push channels) without tight coupling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged { session_id: String, state: ScanState },

    /// A barcode was captured, either decoded by the detector or
    /// manufactured by the fallback timer
    DetectionCaptured {
        session_id: String,
        barcode: String,
        fallback: bool,
    },

    /// The captured barcode was resolved to a product
    ProductResolved {
        session_id: String,
        name: String,
        barcode: String,
        overall_score: i32,
        synthetic: bool,
    },

    /// The reward ledger credited the user for this scan
    Credited {
        session_id: String,
        points_earned: i32,
        eco_score: i64,
        total_scans: i64,
    },

    /// The session ended in failure
    ScanFailed { session_id: String, reason: String },

    /// The session was cancelled by the user
    SessionCancelled { session_id: String },

    /// The post-credit delay elapsed; the scan view should be left
    ExitRequested { session_id: String },
}

impl SessionEvent {
    /// Get the session id associated with this event
    /// All events are session-specific
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::StateChanged { session_id, .. } => session_id,
            SessionEvent::DetectionCaptured { session_id, .. } => session_id,
            SessionEvent::ProductResolved { session_id, .. } => session_id,
            SessionEvent::Credited { session_id, .. } => session_id,
            SessionEvent::ScanFailed { session_id, .. } => session_id,
            SessionEvent::SessionCancelled { session_id } => session_id,
            SessionEvent::ExitRequested { session_id } => session_id,
        }
    }

    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "state_changed",
            SessionEvent::DetectionCaptured { .. } => "detection_captured",
            SessionEvent::ProductResolved { .. } => "product_resolved",
            SessionEvent::Credited { .. } => "credited",
            SessionEvent::ScanFailed { .. } => "scan_failed",
            SessionEvent::SessionCancelled { .. } => "session_cancelled",
            SessionEvent::ExitRequested { .. } => "exit_requested",
        }
    }
}
