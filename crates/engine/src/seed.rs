//! Default roster for an empty board

use persistence::repository::UserRepository;
use persistence::{DbResult, SqlitePool};
use tracing::info;

pub const DEFAULT_ROSTER: [&str; 10] = [
    "Rahul", "Kamal", "Sanak", "Amit", "Priya", "Neha", "Vikas", "Sonia", "Ravi", "Anjali",
];

/// Insert the default roster if there are no users yet.
/// Returns how many users were inserted.
pub async fn seed_default_users(pool: &SqlitePool) -> DbResult<usize> {
    let repo = UserRepository::new(pool);
    if repo.count().await? > 0 {
        return Ok(0);
    }

    let inserted = repo.insert_many(&DEFAULT_ROSTER).await?;
    info!(inserted, "Seeded users");
    Ok(inserted)
}
