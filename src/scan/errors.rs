use thiserror::Error;

use crate::ledger::LedgerError;

/// Error returned when no optical decoding capability is available
///
/// Scan sessions recover from this locally by switching to the demo
/// fallback; it is never surfaced as a request failure.
#[derive(Debug, Error)]
#[error("No barcode detector available on this device")]
pub struct DetectorUnavailable;

/// Terminal failure of a scan session
#[derive(Debug, Error)]
pub enum ScanError {
    /// Manually entered barcode with no catalog match; the manual path
    /// never falls back to a synthetic product
    #[error("No product found for barcode {barcode}")]
    ProductNotFound { barcode: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Catalog error: {0}")]
    Catalog(String),
}
