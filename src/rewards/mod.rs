// Read-only challenge and reward catalog. Consulted by the dashboard and
// rewards views; never mutated by the scan pipeline.

// Public API - what other modules can use
pub use handlers::{list_challenges, list_rewards_for_user};
pub use models::{Challenge, Reward, RewardStatus};
pub use repository::{InMemoryRewardsCatalog, PostgresRewardsCatalog, RewardsCatalog};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
