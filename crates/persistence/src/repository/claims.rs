//! Claim history repository: point awards and the audit trail they leave

use crate::repository::users::UserRecord;
use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A single claim as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClaimRecord {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    /// Unix milliseconds (UTC)
    pub claimed_at: i64,
}

/// A claim joined with the name of the user who made it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClaimHistoryRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub points: i64,
    pub claimed_at: i64,
}

/// Repository for claims
pub struct ClaimRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClaimRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add `points` to the user's total and append the history row, in one transaction.
    ///
    /// Returns `None` (and writes nothing) when the user doesn't exist.
    pub async fn record_claim(
        &self,
        user_id: i64,
        points: i64,
        claimed_at: i64,
    ) -> DbResult<Option<(UserRecord, ClaimRecord)>> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserRecord>(
            r#"UPDATE users SET total_points = total_points + ?1
               WHERE id = ?2
               RETURNING id, name, total_points, profile_image"#,
        )
        .bind(points)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            tx.rollback().await?;
            return Ok(None);
        };

        let claim = sqlx::query_as::<_, ClaimRecord>(
            r#"INSERT INTO claim_history (user_id, points, claimed_at)
               VALUES (?1, ?2, ?3)
               RETURNING id, user_id, points, claimed_at"#,
        )
        .bind(user_id)
        .bind(points)
        .bind(claimed_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((user, claim)))
    }

    /// Claims newest first, optionally capped at `limit` rows
    pub async fn history(&self, limit: Option<i64>) -> DbResult<Vec<ClaimHistoryRow>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.unwrap_or(-1);
        let rows = sqlx::query_as::<_, ClaimHistoryRow>(
            r#"SELECT c.id, u.id AS user_id, u.name AS user_name, c.points, c.claimed_at
               FROM claim_history c
               LEFT JOIN users u ON u.id = c.user_id
               ORDER BY c.claimed_at DESC, c.id DESC
               LIMIT ?1"#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM claim_history")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
