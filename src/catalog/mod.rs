// Public API - what other modules can use
pub use handlers::{get_product, list_products};
pub use models::Product;
pub use repository::{InMemoryProductCatalog, PostgresProductCatalog, ProductCatalog};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
