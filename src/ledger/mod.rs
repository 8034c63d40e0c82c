// The reward ledger: the append-only record of scan events plus the derived
// running totals on each profile. Crediting is the only operation that
// mutates shared state and must be race-free per user.

pub use errors::LedgerError;
pub use models::*;
pub use repository::{
    InMemoryProfileStore, InMemoryScanEventStore, PostgresProfileStore, PostgresScanEventStore,
    ProfileStore, ScanEventStore,
};
pub use service::RewardLedger;

mod errors;
pub mod models;
pub mod repository;
pub mod service;
