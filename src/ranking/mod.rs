// Ranking and aggregation over ledger snapshots: leaderboard rank, score
// distribution buckets and the daily points series. The engine holds no
// persistent index; every call recomputes from the snapshot it is given.

// Public API - what other modules can use
pub use engine::{
    daily_series, rank, ranked, score_distribution, DailyPoints, ScoreDistribution, Standing,
    DEFAULT_WINDOW_DAYS,
};
pub use handlers::{get_dashboard, get_leaderboard};
pub use service::RankingService;
pub use types::{DashboardView, LeaderboardEntry, LeaderboardView};

// Internal modules
mod engine;
mod handlers;
mod service;
mod types;
