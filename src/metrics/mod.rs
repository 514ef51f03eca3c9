pub mod game_metrics;
pub mod leaderboard;
pub mod training_stats;

pub use game_metrics::GameMetrics;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use training_stats::TrainingStats;
