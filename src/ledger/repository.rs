use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

use super::errors::LedgerError;
use super::models::{level_for_score, Profile, ProfileTotals, ScanRecord, ScanWithProduct};
use crate::catalog::models::Product;
use crate::catalog::repository::ProductCatalog;

/// Trait for profile storage
///
/// `apply_credit` is the single mutation point for scores and carries the
/// concurrency contract: concurrent credits for the same user must not lose
/// updates. Implementations use an atomic server-side increment (or an
/// equivalent locked mutation); a plain read-then-overwrite of the two
/// fields is not an acceptable implementation.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), LedgerError>;
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError>;

    /// Full profile set ordered by eco_score descending
    async fn list_profiles(&self) -> Result<Vec<Profile>, LedgerError>;

    /// Atomically adds `points` to the user's eco_score and bumps
    /// total_scans by one, refreshing the stored level; returns the new
    /// totals
    async fn apply_credit(&self, user_id: &str, points: i32) -> Result<ProfileTotals, LedgerError>;
}

/// Trait for the append-only scan event store
#[async_trait]
pub trait ScanEventStore: Send + Sync {
    async fn append(&self, record: &ScanRecord) -> Result<(), LedgerError>;

    /// Most recent scans first, joined with their products
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScanWithProduct>, LedgerError>;

    /// Scans at or after `since`, oldest first, joined with their products
    async fn for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScanWithProduct>, LedgerError>;
}

/// In-memory implementation of ProfileStore for development and testing
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProfileStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory store with pre-populated profiles
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        let mut profile_map = HashMap::new();
        for profile in profiles {
            profile_map.insert(profile.id.clone(), profile);
        }

        Self {
            profiles: Mutex::new(profile_map),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    #[instrument(skip(self, profile))]
    async fn insert_profile(&self, profile: &Profile) -> Result<(), LedgerError> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.contains_key(&profile.id) {
            warn!(user_id = %profile.id, "Profile already exists in memory");
            return Err(LedgerError::Storage("Profile already exists".to_string()));
        }
        profiles.insert(profile.id.clone(), profile.clone());

        debug!(user_id = %profile.id, "Profile created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<Profile>, LedgerError> {
        let profiles = self.profiles.lock().unwrap();
        let mut listing: Vec<Profile> = profiles.values().cloned().collect();
        listing.sort_by(|a, b| b.eco_score.cmp(&a.eco_score));
        Ok(listing)
    }

    #[instrument(skip(self))]
    async fn apply_credit(&self, user_id: &str, points: i32) -> Result<ProfileTotals, LedgerError> {
        // The whole read-modify-write happens under the lock, so concurrent
        // credits serialize instead of losing updates.
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::ProfileNotFound(user_id.to_string()))?;

        profile.eco_score += points as i64;
        profile.total_scans += 1;
        profile.level = level_for_score(profile.eco_score).to_string();
        profile.updated_at = Utc::now();

        debug!(
            user_id = %user_id,
            points = points,
            new_eco_score = profile.eco_score,
            new_total_scans = profile.total_scans,
            "Profile credited in memory"
        );

        Ok(ProfileTotals {
            eco_score: profile.eco_score,
            total_scans: profile.total_scans,
        })
    }
}

/// In-memory implementation of ScanEventStore for development and testing
///
/// Reads join against the product catalog, mirroring the SQL join the
/// Postgres implementation performs.
pub struct InMemoryScanEventStore {
    scans: Mutex<Vec<ScanRecord>>,
    catalog: Arc<dyn ProductCatalog>,
}

impl InMemoryScanEventStore {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self {
            scans: Mutex::new(Vec::new()),
            catalog,
        }
    }

    /// Returns the number of stored scan records
    pub fn scan_count(&self) -> usize {
        self.scans.lock().unwrap().len()
    }

    async fn join_products(
        &self,
        records: Vec<ScanRecord>,
    ) -> Result<Vec<ScanWithProduct>, LedgerError> {
        let mut joined = Vec::with_capacity(records.len());
        for record in records {
            match self
                .catalog
                .find_by_id(&record.product_id)
                .await
                .map_err(|e| LedgerError::Storage(e.to_string()))?
            {
                Some(product) => joined.push(ScanWithProduct { record, product }),
                None => {
                    warn!(
                        product_id = %record.product_id,
                        "Scan references a product missing from the catalog"
                    );
                }
            }
        }
        Ok(joined)
    }
}

#[async_trait]
impl ScanEventStore for InMemoryScanEventStore {
    #[instrument(skip(self, record))]
    async fn append(&self, record: &ScanRecord) -> Result<(), LedgerError> {
        let mut scans = self.scans.lock().unwrap();
        scans.push(record.clone());

        debug!(
            scan_id = %record.id,
            user_id = %record.user_id,
            points_earned = record.points_earned,
            "Scan event appended in memory"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScanWithProduct>, LedgerError> {
        let mut records: Vec<ScanRecord> = {
            let scans = self.scans.lock().unwrap();
            scans
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect()
        };
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);

        self.join_products(records).await
    }

    #[instrument(skip(self))]
    async fn for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScanWithProduct>, LedgerError> {
        let mut records: Vec<ScanRecord> = {
            let scans = self.scans.lock().unwrap();
            scans
                .iter()
                .filter(|s| s.user_id == user_id && s.created_at >= since)
                .cloned()
                .collect()
        };
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        self.join_products(records).await
    }
}

/// PostgreSQL implementation of ProfileStore
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_sqlx_error(e: sqlx::Error) -> LedgerError {
        // Serialization failures surface as transient conflicts so the
        // ledger's bounded retry can absorb them.
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("40001") {
                return LedgerError::Conflict;
            }
        }
        LedgerError::Storage(e.to_string())
    }

    fn profile_from_row(row: &sqlx::postgres::PgRow) -> Profile {
        Profile {
            id: row.get("id"),
            eco_score: row.get("eco_score"),
            total_scans: row.get("total_scans"),
            display_name: row.get("display_name"),
            level: row.get("level"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    #[instrument(skip(self, profile))]
    async fn insert_profile(&self, profile: &Profile) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO profiles (id, eco_score, total_scans, display_name, level, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&profile.id)
        .bind(profile.eco_score)
        .bind(profile.total_scans)
        .bind(&profile.display_name)
        .bind(&profile.level)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %profile.id, "Failed to create profile in database");
            Self::map_sqlx_error(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, LedgerError> {
        let row = sqlx::query(
            "SELECT id, eco_score, total_scans, display_name, level, created_at, updated_at \
             FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(Self::profile_from_row))
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<Profile>, LedgerError> {
        let rows = sqlx::query(
            "SELECT id, eco_score, total_scans, display_name, level, created_at, updated_at \
             FROM profiles ORDER BY eco_score DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(Self::profile_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn apply_credit(&self, user_id: &str, points: i32) -> Result<ProfileTotals, LedgerError> {
        // Single-statement increment: the database serializes concurrent
        // credits for the same row, so no update is lost.
        let row = sqlx::query(
            "UPDATE profiles \
             SET eco_score = eco_score + $2, \
                 total_scans = total_scans + 1, \
                 level = CASE \
                     WHEN eco_score + $2 >= 5000 THEN 'Earth Hero' \
                     WHEN eco_score + $2 >= 2000 THEN 'Green Champion' \
                     WHEN eco_score + $2 >= 1000 THEN 'Eco Guardian' \
                     WHEN eco_score + $2 >= 500 THEN 'Green Explorer' \
                     ELSE 'Eco Rookie' \
                 END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING eco_score, total_scans",
        )
        .bind(user_id)
        .bind(points as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to credit profile in database");
            Self::map_sqlx_error(e)
        })?;

        let row = row.ok_or_else(|| LedgerError::ProfileNotFound(user_id.to_string()))?;

        Ok(ProfileTotals {
            eco_score: row.get("eco_score"),
            total_scans: row.get("total_scans"),
        })
    }
}

/// PostgreSQL implementation of ScanEventStore
pub struct PostgresScanEventStore {
    pool: PgPool,
}

impl PostgresScanEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn scan_with_product_from_row(row: &sqlx::postgres::PgRow) -> ScanWithProduct {
        ScanWithProduct {
            record: ScanRecord {
                id: row.get("id"),
                user_id: row.get("user_id"),
                product_id: row.get("product_id"),
                points_earned: row.get("points_earned"),
                created_at: row.get("created_at"),
            },
            product: Product {
                id: row.get("product_id"),
                barcode: row.get("barcode"),
                name: row.get("name"),
                overall_score: row.get("overall_score"),
                carbon_footprint: row.get("carbon_footprint"),
                ethical_score: row.get("ethical_score"),
                recyclable: row.get("recyclable"),
                created_at: row.get("product_created_at"),
            },
        }
    }
}

const SCAN_JOIN_COLUMNS: &str = "s.id, s.user_id, s.product_id, s.points_earned, s.created_at, \
     p.barcode, p.name, p.overall_score, p.carbon_footprint, p.ethical_score, p.recyclable, \
     p.created_at AS product_created_at";

#[async_trait]
impl ScanEventStore for PostgresScanEventStore {
    #[instrument(skip(self, record))]
    async fn append(&self, record: &ScanRecord) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO scans (id, user_id, product_id, points_earned, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.product_id)
        .bind(record.points_earned)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %record.user_id, "Failed to append scan event");
            LedgerError::ScanWrite(e.to_string())
        })?;

        debug!(scan_id = %record.id, "Scan event appended");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ScanWithProduct>, LedgerError> {
        let query = format!(
            "SELECT {SCAN_JOIN_COLUMNS} FROM scans s \
             JOIN products p ON p.id = s.product_id \
             WHERE s.user_id = $1 ORDER BY s.created_at DESC LIMIT $2"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(rows.iter().map(Self::scan_with_product_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScanWithProduct>, LedgerError> {
        let query = format!(
            "SELECT {SCAN_JOIN_COLUMNS} FROM scans s \
             JOIN products p ON p.id = s.product_id \
             WHERE s.user_id = $1 AND s.created_at >= $2 ORDER BY s.created_at ASC"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(rows.iter().map(Self::scan_with_product_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::InMemoryProductCatalog;
    use chrono::Duration;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn create_test_profile(user_id: &str, eco_score: i64, total_scans: i64) -> Profile {
            let mut profile = Profile::new(user_id.to_string(), Some(user_id.to_string()));
            profile.eco_score = eco_score;
            profile.total_scans = total_scans;
            profile.level = level_for_score(eco_score).to_string();
            profile
        }

        pub fn create_test_product(barcode: &str, overall_score: i32) -> Product {
            Product::new(
                barcode.to_string(),
                format!("Product {}", barcode),
                overall_score,
                70,
                60,
                true,
            )
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_insert_and_get_profile() {
        let store = InMemoryProfileStore::new();
        let profile = create_test_profile("user-1", 0, 0);

        store.insert_profile(&profile).await.unwrap();

        let retrieved = store.get_profile("user-1").await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, "user-1");
    }

    #[tokio::test]
    async fn test_get_nonexistent_profile() {
        let store = InMemoryProfileStore::new();
        assert!(store.get_profile("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_profile() {
        let store = InMemoryProfileStore::new();
        let profile = create_test_profile("user-1", 0, 0);

        store.insert_profile(&profile).await.unwrap();
        let result = store.insert_profile(&profile).await;
        assert!(matches!(result.unwrap_err(), LedgerError::Storage(_)));
    }

    #[tokio::test]
    async fn test_apply_credit_updates_totals_and_level() {
        let store = InMemoryProfileStore::new();
        store
            .insert_profile(&create_test_profile("user-1", 480, 9))
            .await
            .unwrap();

        let totals = store.apply_credit("user-1", 40).await.unwrap();
        assert_eq!(totals.eco_score, 520);
        assert_eq!(totals.total_scans, 10);

        let profile = store.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.level, "Green Explorer");
    }

    #[tokio::test]
    async fn test_apply_credit_missing_profile() {
        let store = InMemoryProfileStore::new();
        let result = store.apply_credit("ghost", 10).await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::ProfileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_credits_lose_no_updates() {
        let store = Arc::new(InMemoryProfileStore::new());
        store
            .insert_profile(&create_test_profile("user-1", 0, 0))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.apply_credit("user-1", 42).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let profile = store.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.eco_score, 25 * 42);
        assert_eq!(profile.total_scans, 25);
    }

    #[tokio::test]
    async fn test_list_profiles_ordered_by_score() {
        let store = InMemoryProfileStore::with_profiles(vec![
            create_test_profile("low", 10, 1),
            create_test_profile("high", 900, 20),
            create_test_profile("mid", 300, 8),
        ]);

        let profiles = store.list_profiles().await.unwrap();
        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_append_and_read_back_scans() {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let product = create_test_product("111", 80);
        catalog.insert(product.clone());

        let store = InMemoryScanEventStore::new(catalog);
        store
            .append(&ScanRecord::new("user-1", &product.id, 40))
            .await
            .unwrap();
        store
            .append(&ScanRecord::new("user-1", &product.id, 40))
            .await
            .unwrap();
        store
            .append(&ScanRecord::new("user-2", &product.id, 40))
            .await
            .unwrap();

        let recent = store.recent_for_user("user-1", 5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].product.barcode, "111");

        let limited = store.recent_for_user("user-1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_for_user_since_filters_and_orders() {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let product = create_test_product("222", 60);
        catalog.insert(product.clone());

        let store = InMemoryScanEventStore::new(catalog);

        let mut old = ScanRecord::new("user-1", &product.id, 30);
        old.created_at = Utc::now() - Duration::days(10);
        store.append(&old).await.unwrap();

        let recent = ScanRecord::new("user-1", &product.id, 30);
        store.append(&recent).await.unwrap();

        let since = Utc::now() - Duration::days(7);
        let window = store.for_user_since("user-1", since).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].record.id, recent.id);
    }
}
