use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecoscan::catalog::repository::InMemoryProductCatalog;
use ecoscan::catalog::{self, Product};
use ecoscan::ledger::repository::{InMemoryProfileStore, InMemoryScanEventStore};
use ecoscan::ledger::{Profile, RewardLedger};
use ecoscan::ranking;
use ecoscan::rewards::models::{Challenge, Reward};
use ecoscan::rewards;
use ecoscan::rewards::repository::InMemoryRewardsCatalog;
use ecoscan::scan::detector::UnavailableDetector;
use ecoscan::scan::{self, ScanTimings, SessionManager};
use ecoscan::shared::AppState;
use ecoscan::EventBus;

fn seed_products() -> Vec<Product> {
    vec![
        Product::new(
            "8901030778261".to_string(),
            "Bamboo Toothbrush".to_string(),
            85,
            80,
            90,
            true,
        ),
        Product::new(
            "8901719110018".to_string(),
            "Organic Green Tea".to_string(),
            78,
            72,
            85,
            true,
        ),
        Product::new(
            "5000112637922".to_string(),
            "Recycled Paper Towels".to_string(),
            70,
            65,
            75,
            true,
        ),
        Product::new(
            "7622210449283".to_string(),
            "Chocolate Bar".to_string(),
            55,
            45,
            60,
            false,
        ),
        Product::new(
            "4902430735247".to_string(),
            "Disposable Razor".to_string(),
            35,
            25,
            40,
            false,
        ),
    ]
}

fn seed_challenges() -> Vec<Challenge> {
    vec![
        Challenge {
            id: "challenge-1".to_string(),
            title: "Scan 5 products".to_string(),
            description: "Scan any five products this week".to_string(),
            points: 50,
            active: true,
        },
        Challenge {
            id: "challenge-2".to_string(),
            title: "Go recyclable".to_string(),
            description: "Scan three recyclable products".to_string(),
            points: 75,
            active: true,
        },
    ]
}

fn seed_rewards() -> Vec<Reward> {
    vec![
        Reward {
            id: "reward-1".to_string(),
            name: "Sticker Pack".to_string(),
            description: "Eco sticker pack shipped to you".to_string(),
            points_required: 100,
            partner_ngo: "Green Earth".to_string(),
            active: true,
        },
        Reward {
            id: "reward-2".to_string(),
            name: "Plant a Tree".to_string(),
            description: "One tree planted in your name".to_string(),
            points_required: 500,
            partner_ngo: "Green Earth".to_string(),
            active: true,
        },
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecoscan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EcoScan reward server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let product_catalog = Arc::new(InMemoryProductCatalog::with_products(seed_products()));
    let profile_store = Arc::new(InMemoryProfileStore::with_profiles(vec![Profile::new(
        "demo-user".to_string(),
        Some("Eco Warrior".to_string()),
    )]));
    let scan_store = Arc::new(InMemoryScanEventStore::new(product_catalog.clone()));
    let rewards_catalog = Arc::new(InMemoryRewardsCatalog::with_entries(
        seed_challenges(),
        seed_rewards(),
    ));

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let product_catalog = Arc::new(PostgresProductCatalog::new(pool.clone()));
    // let profile_store = Arc::new(PostgresProfileStore::new(pool.clone()));
    // let scan_store = Arc::new(PostgresScanEventStore::new(pool.clone()));
    // let rewards_catalog = Arc::new(PostgresRewardsCatalog::new(pool));

    let reward_ledger = Arc::new(RewardLedger::new(profile_store.clone(), scan_store.clone()));

    let app_state = AppState {
        product_catalog,
        profile_store,
        scan_store,
        rewards_catalog,
        reward_ledger,
        session_manager: Arc::new(SessionManager::new()),
        // Servers have no camera; camera sessions take the demo fallback
        detector: Arc::new(UnavailableDetector),
        event_bus: EventBus::new(),
        scan_timings: ScanTimings::default(),
    };

    // build our application
    let app = Router::new()
        .route("/", get(|| async { "EcoScan reward server" }))
        .route("/products", get(catalog::list_products))
        .route("/products/:barcode", get(catalog::get_product))
        .route("/scan/manual", post(scan::manual_scan))
        .route("/scan/camera", post(scan::camera_scan))
        .route("/scan/:session_id", delete(scan::cancel_scan))
        .route("/leaderboard/:user_id", get(ranking::get_leaderboard))
        .route("/dashboard/:user_id", get(ranking::get_dashboard))
        .route("/challenges", get(rewards::list_challenges))
        .route("/rewards/:user_id", get(rewards::list_rewards_for_user))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
