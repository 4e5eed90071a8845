//! Users repository: the players on the board

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

const USER_COLUMNS: &str = "id, name, total_points, profile_image";

/// A persisted user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub total_points: i64,
    /// Avatar URL or upload path; empty when the user has none
    pub profile_image: String,
}

/// Repository for users
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a user with zero points
    pub async fn insert(&self, name: &str, profile_image: &str) -> DbResult<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (name, profile_image) VALUES (?1, ?2) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(profile_image)
        .fetch_one(self.pool)
        .await?;

        Ok(record)
    }

    /// Insert several users in one transaction. Returns the number inserted.
    pub async fn insert_many(&self, names: &[&str]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;
        for name in names {
            sqlx::query("INSERT INTO users (name) VALUES (?1)")
                .bind(*name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!(count = names.len(), "Inserted users");
        Ok(names.len())
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// All users in creation order
    pub async fn list(&self) -> DbResult<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// All users, most points first (earlier users win ties)
    pub async fn list_by_points(&self) -> DbResult<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY total_points DESC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Replace a user's avatar. `None` if the user doesn't exist.
    pub async fn set_profile_image(
        &self,
        id: i64,
        profile_image: &str,
    ) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET profile_image = ?1 WHERE id = ?2 RETURNING {USER_COLUMNS}"
        ))
        .bind(profile_image)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }
}
