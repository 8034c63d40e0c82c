use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::models::Product;
use super::repository::ProductCatalog;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing the product catalog
///
/// GET /products
/// Returns all products ordered by overall_score descending
#[instrument(name = "list_products", skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.product_catalog.list_all().await?;

    info!(product_count = products.len(), "Products listed");

    Ok(Json(products))
}

/// HTTP handler for looking up a single product by barcode
///
/// GET /products/:barcode
#[instrument(name = "get_product", skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .product_catalog
        .find_by_barcode(&barcode)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No product found for barcode {}", barcode)))?;

    info!(barcode = %barcode, name = %product.name, "Product looked up");

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::InMemoryProductCatalog;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app_with_catalog(catalog: Arc<InMemoryProductCatalog>) -> Router {
        let app_state = AppStateBuilder::new()
            .with_product_catalog(catalog)
            .build();

        Router::new()
            .route("/products", axum::routing::get(list_products))
            .route("/products/:barcode", axum::routing::get(get_product))
            .with_state(app_state)
    }

    #[tokio::test]
    async fn test_get_product_handler() {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        catalog.insert(Product::new(
            "8901030778261".to_string(),
            "Bamboo Toothbrush".to_string(),
            85,
            80,
            90,
            true,
        ));
        let app = app_with_catalog(catalog);

        let request = Request::builder()
            .method("GET")
            .uri("/products/8901030778261")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let product: Product = serde_json::from_slice(&body).unwrap();
        assert_eq!(product.name, "Bamboo Toothbrush");
        assert_eq!(product.overall_score, 85);
    }

    #[tokio::test]
    async fn test_get_unknown_product_returns_404() {
        let app = app_with_catalog(Arc::new(InMemoryProductCatalog::new()));

        let request = Request::builder()
            .method("GET")
            .uri("/products/0000000000000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_products_handler() {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        catalog.insert(Product::new(
            "1".to_string(),
            "Solar Charger".to_string(),
            92,
            85,
            88,
            true,
        ));
        catalog.insert(Product::new(
            "2".to_string(),
            "Plastic Bottle".to_string(),
            25,
            20,
            30,
            false,
        ));
        let app = app_with_catalog(catalog);

        let request = Request::builder()
            .method("GET")
            .uri("/products")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let products: Vec<Product> = serde_json::from_slice(&body).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Solar Charger");
    }
}
