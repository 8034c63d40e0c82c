use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the challenges table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: i32,
    pub active: bool,
}

/// Database model for the rewards table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub description: String,
    pub points_required: i32,
    pub partner_ngo: String,
    pub active: bool,
}

impl Reward {
    /// Whether a profile with the given score could redeem this reward
    pub fn redeemable_with(&self, eco_score: i64) -> bool {
        eco_score >= self.points_required as i64
    }

    /// Points still missing before the reward is redeemable; zero once
    /// redeemable
    pub fn points_missing(&self, eco_score: i64) -> i64 {
        (self.points_required as i64 - eco_score).max(0)
    }
}

/// A reward annotated with redeemability for a specific profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardStatus {
    pub reward: Reward,
    pub redeemable: bool,
    pub points_missing: i64,
}

impl RewardStatus {
    pub fn for_score(reward: Reward, eco_score: i64) -> Self {
        let redeemable = reward.redeemable_with(eco_score);
        let points_missing = reward.points_missing(eco_score);
        Self {
            reward,
            redeemable,
            points_missing,
        }
    }
}
