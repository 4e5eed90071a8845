//! Leaderboard engine: claims, ranking and live refresh
//!
//! Provides:
//! - `LeaderboardService`: users, claims, ranked board and claim history
//! - Random point awards (1 to 10 per claim)
//! - A broadcast notifier that tells connected clients to refetch

pub mod error;
pub mod notifier;
pub mod points;
pub mod ranking;
pub mod seed;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use error::{LeaderboardError, LeaderboardResult};
pub use notifier::{LeaderboardEvent, UpdateNotifier};
pub use points::{FixedPoints, PointsSource, RandomPoints, MAX_CLAIM_POINTS, MIN_CLAIM_POINTS};
pub use ranking::rank_users;
pub use seed::{seed_default_users, DEFAULT_ROSTER};
pub use service::LeaderboardService;
pub use types::*;
