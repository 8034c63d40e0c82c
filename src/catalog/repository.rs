use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::Product;
use crate::shared::AppError;

/// Trait for product catalog lookups
///
/// The catalog is read-only from the scan pipeline's point of view; barcode
/// lookup is exact-match and case-sensitive, with no normalization.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError>;
    async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, AppError>;

    /// Lists the full catalog ordered by overall_score descending, for
    /// manual selection
    async fn list_all(&self) -> Result<Vec<Product>, AppError>;
}

/// In-memory implementation of ProductCatalog for development and testing
pub struct InMemoryProductCatalog {
    products: Mutex<HashMap<String, Product>>,
}

impl Default for InMemoryProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProductCatalog {
    /// Creates a new empty in-memory catalog
    pub fn new() -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory catalog with pre-populated products
    pub fn with_products(products: Vec<Product>) -> Self {
        let mut product_map = HashMap::new();
        for product in products {
            product_map.insert(product.barcode.clone(), product);
        }

        Self {
            products: Mutex::new(product_map),
        }
    }

    /// Adds a product to the catalog, keyed by barcode
    pub fn insert(&self, product: Product) {
        let mut products = self.products.lock().unwrap();
        products.insert(product.barcode.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    #[instrument(skip(self))]
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let products = self.products.lock().unwrap();
        let product = products.get(barcode).cloned();

        match &product {
            Some(p) => debug!(barcode = %barcode, name = %p.name, "Product found in memory"),
            None => debug!(barcode = %barcode, "Product not found in memory"),
        }

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        let products = self.products.lock().unwrap();
        Ok(products.values().find(|p| p.id == product_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let products = self.products.lock().unwrap();
        let mut listing: Vec<Product> = products.values().cloned().collect();
        listing.sort_by(|a, b| b.overall_score.cmp(&a.overall_score));

        debug!(count = listing.len(), "Products listed from memory");
        Ok(listing)
    }
}

/// PostgreSQL implementation of the product catalog
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn product_from_row(row: &sqlx::postgres::PgRow) -> Product {
        Product {
            id: row.get("id"),
            barcode: row.get("barcode"),
            name: row.get("name"),
            overall_score: row.get("overall_score"),
            carbon_footprint: row.get("carbon_footprint"),
            ethical_score: row.get("ethical_score"),
            recyclable: row.get("recyclable"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    #[instrument(skip(self))]
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query(
            "SELECT id, barcode, name, overall_score, carbon_footprint, ethical_score, recyclable, created_at \
             FROM products WHERE barcode = $1",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, barcode = %barcode, "Failed to fetch product from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::product_from_row))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query(
            "SELECT id, barcode, name, overall_score, carbon_footprint, ethical_score, recyclable, created_at \
             FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, product_id = %product_id, "Failed to fetch product from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::product_from_row))
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query(
            "SELECT id, barcode, name, overall_score, carbon_footprint, ethical_score, recyclable, created_at \
             FROM products ORDER BY overall_score DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list products from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows.iter().map(Self::product_from_row).collect())
    }
}
