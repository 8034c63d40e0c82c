// The scan pipeline: a state machine that turns a detected or manually
// entered barcode into a resolved product and exactly one ledger credit.

// Public API - what other modules can use
pub use detector::{Activation, Detector, DetectorHandle, DetectorLease, UnavailableDetector};
pub use errors::{DetectorUnavailable, ScanError};
pub use handlers::{camera_scan, cancel_scan, manual_scan};
pub use manager::SessionManager;
pub use session::{DetectionGate, DetectionTrigger, ScanSession, ScanState};
pub use types::{
    CameraScanRequest, CreditSummary, ManualScanRequest, ScanResponse, ScanTimings, SessionOutcome,
};

// Internal modules
pub mod detector;
mod errors;
mod handlers;
pub mod manager;
pub mod session;
pub mod synthetic;
pub mod types;
