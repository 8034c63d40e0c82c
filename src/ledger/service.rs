use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::errors::LedgerError;
use super::models::{CreditOutcome, ScanRecord};
use super::repository::{ProfileStore, ScanEventStore};
use crate::catalog::models::Product;

/// How many times a conflicted profile update is retried before the credit
/// is surfaced as a transient failure
const MAX_CREDIT_ATTEMPTS: u32 = 3;

/// Service applying scan credits to the ledger
///
/// `credit` is the only path that mutates a profile. The caller does not
/// retry on its own; conflict retry is internal to this operation.
pub struct RewardLedger {
    profiles: Arc<dyn ProfileStore>,
    scans: Arc<dyn ScanEventStore>,
}

impl RewardLedger {
    pub fn new(profiles: Arc<dyn ProfileStore>, scans: Arc<dyn ScanEventStore>) -> Self {
        Self { profiles, scans }
    }

    /// Credits a user for one resolved scan
    ///
    /// Real products get a durable scan record first; if that append fails
    /// the credit aborts with no profile mutation. Synthetic products skip
    /// the record and only update the profile totals.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn credit(
        &self,
        user_id: &str,
        product: &Product,
        synthetic: bool,
    ) -> Result<CreditOutcome, LedgerError> {
        let points_earned = product.points_value();

        if synthetic {
            debug!(user_id = %user_id, "Synthetic product, skipping scan record");
        } else {
            let record = ScanRecord::new(user_id, &product.id, points_earned);
            // Any append failure aborts the credit before the profile is
            // touched.
            self.scans.append(&record).await.map_err(|e| match e {
                e @ LedgerError::ScanWrite(_) => e,
                other => LedgerError::ScanWrite(other.to_string()),
            })?;
            debug!(user_id = %user_id, scan_id = %record.id, "Scan event recorded");
        }

        let mut attempt = 0;
        let totals = loop {
            attempt += 1;
            match self.profiles.apply_credit(user_id, points_earned).await {
                Ok(totals) => break totals,
                Err(LedgerError::Conflict) if attempt < MAX_CREDIT_ATTEMPTS => {
                    warn!(
                        user_id = %user_id,
                        attempt = attempt,
                        "Profile credit conflicted, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            user_id = %user_id,
            points_earned = points_earned,
            new_eco_score = totals.eco_score,
            new_total_scans = totals.total_scans,
            "Scan credited"
        );

        Ok(CreditOutcome {
            points_earned,
            eco_score: totals.eco_score,
            total_scans: totals.total_scans,
        })
    }
}
