use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Challenge, Reward};
use crate::shared::AppError;

/// Trait for the read-only challenge/reward catalog
#[async_trait]
pub trait RewardsCatalog: Send + Sync {
    /// Up to `limit` active challenges
    async fn list_active_challenges(&self, limit: usize) -> Result<Vec<Challenge>, AppError>;

    /// All rewards ordered by points_required ascending
    async fn list_rewards(&self) -> Result<Vec<Reward>, AppError>;
}

/// In-memory implementation of RewardsCatalog for development and testing
pub struct InMemoryRewardsCatalog {
    challenges: Mutex<Vec<Challenge>>,
    rewards: Mutex<Vec<Reward>>,
}

impl Default for InMemoryRewardsCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRewardsCatalog {
    /// Creates a new empty in-memory catalog
    pub fn new() -> Self {
        Self {
            challenges: Mutex::new(Vec::new()),
            rewards: Mutex::new(Vec::new()),
        }
    }

    /// Creates an in-memory catalog with pre-populated entries
    pub fn with_entries(challenges: Vec<Challenge>, rewards: Vec<Reward>) -> Self {
        Self {
            challenges: Mutex::new(challenges),
            rewards: Mutex::new(rewards),
        }
    }
}

#[async_trait]
impl RewardsCatalog for InMemoryRewardsCatalog {
    #[instrument(skip(self))]
    async fn list_active_challenges(&self, limit: usize) -> Result<Vec<Challenge>, AppError> {
        let challenges = self.challenges.lock().unwrap();
        let active: Vec<Challenge> = challenges
            .iter()
            .filter(|c| c.active)
            .take(limit)
            .cloned()
            .collect();

        debug!(count = active.len(), "Active challenges listed from memory");
        Ok(active)
    }

    #[instrument(skip(self))]
    async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        let rewards = self.rewards.lock().unwrap();
        let mut listing: Vec<Reward> = rewards.clone();
        listing.sort_by_key(|r| r.points_required);
        Ok(listing)
    }
}

/// PostgreSQL implementation of the rewards catalog
pub struct PostgresRewardsCatalog {
    pool: PgPool,
}

impl PostgresRewardsCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardsCatalog for PostgresRewardsCatalog {
    #[instrument(skip(self))]
    async fn list_active_challenges(&self, limit: usize) -> Result<Vec<Challenge>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, description, points, active FROM challenges \
             WHERE active = TRUE LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list challenges from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows
            .iter()
            .map(|row| Challenge {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                points: row.get("points"),
                active: row.get("active"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, description, points_required, partner_ngo, active FROM rewards \
             ORDER BY points_required ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list rewards from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows
            .iter()
            .map(|row| Reward {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                points_required: row.get("points_required"),
                partner_ngo: row.get("partner_ngo"),
                active: row.get("active"),
            })
            .collect())
    }
}
