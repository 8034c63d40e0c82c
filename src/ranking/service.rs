use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::engine;
use super::types::{DashboardView, LeaderboardEntry, LeaderboardView};
use crate::ledger::repository::{ProfileStore, ScanEventStore};
use crate::rewards::repository::RewardsCatalog;
use crate::shared::AppError;

/// Leaderboard rows shown at most
const LEADERBOARD_LIMIT: usize = 50;
/// Recent scans on the dashboard, also feeding the score distribution
const RECENT_SCANS_LIMIT: usize = 5;
/// Active challenges surfaced on the dashboard
const DASHBOARD_CHALLENGES: usize = 3;

/// Service assembling ranked views from store snapshots
///
/// Results are only as fresh as the snapshots read here; a credit landing
/// concurrently shows up on the next load.
pub struct RankingService {
    profiles: Arc<dyn ProfileStore>,
    scans: Arc<dyn ScanEventStore>,
    rewards: Arc<dyn RewardsCatalog>,
}

impl RankingService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        scans: Arc<dyn ScanEventStore>,
        rewards: Arc<dyn RewardsCatalog>,
    ) -> Self {
        Self {
            profiles,
            scans,
            rewards,
        }
    }

    /// Builds the leaderboard: the top profiles plus the caller's standing
    #[instrument(skip(self))]
    pub async fn leaderboard(&self, user_id: &str) -> Result<LeaderboardView, AppError> {
        let profiles = self.profiles.list_profiles().await?;
        let standing = engine::rank(&profiles, user_id);

        let leaders: Vec<LeaderboardEntry> = engine::ranked(profiles)
            .into_iter()
            .take(LEADERBOARD_LIMIT)
            .map(LeaderboardEntry::from)
            .collect();

        debug!(
            user_id = %user_id,
            rank = ?standing.rank,
            total = standing.total,
            "Leaderboard assembled"
        );

        Ok(LeaderboardView {
            leaders,
            your_rank: standing.rank,
            total_users: standing.total,
        })
    }

    /// Builds the dashboard: profile, standing, recent scans, score
    /// distribution, trailing daily series and active challenges
    #[instrument(skip(self))]
    pub async fn dashboard(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DashboardView, AppError> {
        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No profile for user {}", user_id)))?;

        let profiles = self.profiles.list_profiles().await?;
        let standing = engine::rank(&profiles, user_id);

        let recent_scans = self
            .scans
            .recent_for_user(user_id, RECENT_SCANS_LIMIT)
            .await?;
        let distribution = engine::score_distribution(&recent_scans);

        let since = now - Duration::days(engine::DEFAULT_WINDOW_DAYS as i64);
        let history = self.scans.for_user_since(user_id, since).await?;
        let daily_points =
            engine::daily_series(&history, engine::DEFAULT_WINDOW_DAYS, now.date_naive());

        let challenges = self
            .rewards
            .list_active_challenges(DASHBOARD_CHALLENGES)
            .await?;

        Ok(DashboardView {
            profile,
            rank: standing.rank,
            total_users: standing.total,
            recent_scans,
            distribution,
            daily_points,
            challenges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::Product;
    use crate::catalog::repository::InMemoryProductCatalog;
    use crate::ledger::models::{Profile, ScanRecord};
    use crate::ledger::repository::{InMemoryProfileStore, InMemoryScanEventStore};
    use crate::rewards::models::Challenge;
    use crate::rewards::repository::InMemoryRewardsCatalog;

    fn profile(id: &str, eco_score: i64) -> Profile {
        let mut profile = Profile::new(id.to_string(), Some(id.to_string()));
        profile.eco_score = eco_score;
        profile
    }

    struct Fixture {
        service: RankingService,
        catalog: Arc<InMemoryProductCatalog>,
        scans: Arc<InMemoryScanEventStore>,
    }

    fn fixture(profiles: Vec<Profile>, challenges: Vec<Challenge>) -> Fixture {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let scans = Arc::new(InMemoryScanEventStore::new(catalog.clone()));
        let service = RankingService::new(
            Arc::new(InMemoryProfileStore::with_profiles(profiles)),
            scans.clone(),
            Arc::new(InMemoryRewardsCatalog::with_entries(challenges, vec![])),
        );
        Fixture {
            service,
            catalog,
            scans,
        }
    }

    #[tokio::test]
    async fn leaderboard_orders_and_ranks() {
        let f = fixture(
            vec![
                profile("alice", 300),
                profile("bob", 900),
                profile("carol", 500),
            ],
            vec![],
        );

        let view = f.service.leaderboard("alice").await.unwrap();
        assert_eq!(view.total_users, 3);
        assert_eq!(view.your_rank, Some(3));
        assert_eq!(view.leaders[0].id, "bob");
        assert_eq!(view.leaders[2].id, "alice");
    }

    #[tokio::test]
    async fn leaderboard_rank_is_none_for_unknown_user() {
        let f = fixture(vec![profile("alice", 300)], vec![]);

        let view = f.service.leaderboard("ghost").await.unwrap();
        assert_eq!(view.your_rank, None);
        assert_eq!(view.total_users, 1);
    }

    #[tokio::test]
    async fn dashboard_assembles_all_sections() {
        let challenges = vec![
            Challenge {
                id: "c1".to_string(),
                title: "Scan 5 products".to_string(),
                description: "Any five".to_string(),
                points: 50,
                active: true,
            },
            Challenge {
                id: "c2".to_string(),
                title: "Inactive".to_string(),
                description: "Hidden".to_string(),
                points: 10,
                active: false,
            },
        ];
        let f = fixture(vec![profile("user-1", 140)], challenges);

        let product = Product::new("111".to_string(), "Granola".to_string(), 80, 70, 60, true);
        f.catalog.insert(product.clone());
        f.scans
            .append(&ScanRecord::new("user-1", &product.id, 40))
            .await
            .unwrap();

        let view = f.service.dashboard("user-1", Utc::now()).await.unwrap();

        assert_eq!(view.profile.id, "user-1");
        assert_eq!(view.rank, Some(1));
        assert_eq!(view.total_users, 1);
        assert_eq!(view.recent_scans.len(), 1);
        assert_eq!(view.distribution.high, 40);
        assert_eq!(view.daily_points.len(), 7);
        assert_eq!(view.daily_points.last().unwrap().points, 40);
        assert_eq!(view.challenges.len(), 1);
        assert_eq!(view.challenges[0].id, "c1");
    }

    #[tokio::test]
    async fn dashboard_for_unknown_user_is_not_found() {
        let f = fixture(vec![], vec![]);
        let result = f.service.dashboard("ghost", Utc::now()).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
