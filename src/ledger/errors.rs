use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Appending the scan event failed; the credit is aborted with no
    /// profile mutation
    #[error("Failed to record scan event: {0}")]
    ScanWrite(String),

    /// No profile row exists for the user being credited
    #[error("Profile not found for user {0}")]
    ProfileNotFound(String),

    /// A concurrent credit raced this one; retried internally up to a
    /// bounded attempt count
    #[error("Profile update conflicted with a concurrent credit")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(String),
}
