use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::catalog::models::Product;

/// Level ladder thresholds, lowest first
const LEVELS: [(i64, &str); 5] = [
    (0, "Eco Rookie"),
    (500, "Green Explorer"),
    (1000, "Eco Guardian"),
    (2000, "Green Champion"),
    (5000, "Earth Hero"),
];

/// Display level for a given score
pub fn level_for_score(eco_score: i64) -> &'static str {
    LEVELS
        .iter()
        .rev()
        .find(|(min, _)| eco_score >= *min)
        .map(|(_, name)| *name)
        .unwrap_or(LEVELS[0].1)
}

/// Database model for the profiles table
///
/// A profile's score and scan count are mutated only through
/// `RewardLedger::credit`; everything else reads snapshots.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    /// User identity; primary key
    pub id: String,
    pub eco_score: i64,
    pub total_scans: i64,
    pub display_name: Option<String>,
    pub level: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a fresh profile with zero score
    pub fn new(user_id: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: user_id,
            eco_score: 0,
            total_scans: 0,
            display_name,
            level: level_for_score(0).to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The running totals returned by a successful credit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileTotals {
    pub eco_score: i64,
    pub total_scans: i64,
}

/// Database model for the scans table
///
/// Append-only: a record is created once per successfully credited real
/// scan and never mutated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub points_earned: i32,
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(user_id: &str, product_id: &str, points_earned: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            points_earned,
            created_at: Utc::now(),
        }
    }
}

/// A scan record joined with the product it references, as read back for
/// statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWithProduct {
    pub record: ScanRecord,
    pub product: Product,
}

/// Result of a successful credit, for display to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditOutcome {
    pub points_earned: i32,
    pub eco_score: i64,
    pub total_scans: i64,
}
