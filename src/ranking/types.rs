use serde::{Deserialize, Serialize};

use super::engine::{DailyPoints, ScoreDistribution};
use crate::ledger::models::{Profile, ScanWithProduct};
use crate::rewards::models::Challenge;

/// One row of the leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub display_name: Option<String>,
    pub level: String,
    pub eco_score: i64,
    pub total_scans: i64,
}

impl From<Profile> for LeaderboardEntry {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            level: profile.level,
            eco_score: profile.eco_score,
            total_scans: profile.total_scans,
        }
    }
}

/// Response for the leaderboard view
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub leaders: Vec<LeaderboardEntry>,
    /// The requesting user's 1-based rank, if they have a profile
    pub your_rank: Option<usize>,
    pub total_users: usize,
}

/// Response for the dashboard view
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardView {
    pub profile: Profile,
    pub rank: Option<usize>,
    pub total_users: usize,
    pub recent_scans: Vec<ScanWithProduct>,
    pub distribution: ScoreDistribution,
    pub daily_points: Vec<DailyPoints>,
    pub challenges: Vec<Challenge>,
}
