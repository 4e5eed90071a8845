//! Leaderboard ranking

use crate::types::{LeaderboardEntry, UserView};
use persistence::repository::UserRecord;

/// Rank users by total points, highest first.
///
/// Ties go to the earlier-created user (lower id). Ranks are positional, so
/// tied users still get distinct, consecutive ranks starting at 1.
pub fn rank_users(mut users: Vec<UserRecord>) -> Vec<LeaderboardEntry> {
    users.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.id.cmp(&b.id))
    });

    users
        .into_iter()
        .enumerate()
        .map(|(idx, user)| LeaderboardEntry {
            rank: idx + 1,
            user: UserView::from(user),
        })
        .collect()
}
