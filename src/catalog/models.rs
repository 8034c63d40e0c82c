use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the products table
///
/// Products are immutable once created and owned by the catalog; the scan
/// pipeline only ever reads them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub barcode: String,
    pub name: String,
    /// Aggregate sustainability score, 0-100
    pub overall_score: i32,
    /// 0-100, higher is better
    pub carbon_footprint: i32,
    /// 0-100, higher is better
    pub ethical_score: i32,
    pub recyclable: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new catalog product with a generated id
    pub fn new(
        barcode: String,
        name: String,
        overall_score: i32,
        carbon_footprint: i32,
        ethical_score: i32,
        recyclable: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            barcode,
            name,
            overall_score,
            carbon_footprint,
            ethical_score,
            recyclable,
            created_at: Utc::now(),
        }
    }

    /// Points awarded for scanning this product: half the overall score,
    /// rounded down
    pub fn points_value(&self) -> i32 {
        self.overall_score / 2
    }
}
