//! Leaderboard service: every read and write the API exposes
//!
//! Writes (new user, avatar change, claim) hit the database first and then
//! broadcast a single refresh so connected clients refetch.

use crate::error::{LeaderboardError, LeaderboardResult};
use crate::notifier::{LeaderboardEvent, UpdateNotifier};
use crate::points::{PointsSource, RandomPoints};
use crate::ranking::rank_users;
use crate::seed::seed_default_users;
use crate::types::{ClaimOutcome, HistoryEntry, LeaderboardEntry, NewUser, UserView};
use chrono::Utc;
use persistence::repository::{ClaimRepository, UserRepository};
use persistence::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub struct LeaderboardService {
    pool: SqlitePool,
    notifier: UpdateNotifier,
    points: Arc<dyn PointsSource>,
}

impl LeaderboardService {
    /// Service with random claim awards
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_points(pool, Arc::new(RandomPoints))
    }

    pub fn with_points(pool: SqlitePool, points: Arc<dyn PointsSource>) -> Self {
        Self {
            pool,
            notifier: UpdateNotifier::new(),
            points,
        }
    }

    pub fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeaderboardEvent> {
        self.notifier.subscribe()
    }

    pub fn connected_clients(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// All users in creation order
    pub async fn list_users(&self) -> LeaderboardResult<Vec<UserView>> {
        let users = UserRepository::new(&self.pool).list().await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    pub async fn add_user(&self, new_user: NewUser) -> LeaderboardResult<UserView> {
        let name = new_user.name.trim();
        if name.is_empty() {
            return Err(LeaderboardError::Validation("Name required".into()));
        }

        let user = UserRepository::new(&self.pool)
            .insert(name, new_user.profile_image.trim())
            .await?;
        info!(user_id = user.id, name = %user.name, "User added");

        self.notifier.notify();
        Ok(user.into())
    }

    /// Replace a user's avatar; an empty string removes it
    pub async fn update_profile_image(
        &self,
        user_id: i64,
        profile_image: &str,
    ) -> LeaderboardResult<UserView> {
        let user = UserRepository::new(&self.pool)
            .set_profile_image(user_id, profile_image.trim())
            .await?
            .ok_or(LeaderboardError::UserNotFound(user_id))?;
        info!(user_id, "Profile image updated");

        self.notifier.notify();
        Ok(user.into())
    }

    /// Award the user a random number of points and log the claim
    pub async fn claim(&self, user_id: i64) -> LeaderboardResult<ClaimOutcome> {
        let points = self.points.roll();
        let claimed_at = Utc::now().timestamp_millis();

        let (user, claim) = ClaimRepository::new(&self.pool)
            .record_claim(user_id, points, claimed_at)
            .await?
            .ok_or(LeaderboardError::UserNotFound(user_id))?;
        info!(
            user_id,
            points,
            total = user.total_points,
            claim_id = claim.id,
            "Points claimed"
        );

        self.notifier.notify();
        Ok(ClaimOutcome {
            points_awarded: points,
            updated_user: user.into(),
        })
    }

    /// Ranked board, recomputed on every call
    pub async fn leaderboard(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let users = UserRepository::new(&self.pool).list_by_points().await?;
        Ok(rank_users(users))
    }

    /// Claims newest first
    pub async fn history(&self, limit: Option<i64>) -> LeaderboardResult<Vec<HistoryEntry>> {
        let rows = ClaimRepository::new(&self.pool).history(limit).await?;
        debug!(rows = rows.len(), "History loaded");
        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    /// Seed the default roster on an empty board. Notifies only if users were added.
    pub async fn seed_if_empty(&self) -> LeaderboardResult<usize> {
        let inserted = seed_default_users(&self.pool).await?;
        if inserted > 0 {
            self.notifier.notify();
        }
        Ok(inserted)
    }
}
