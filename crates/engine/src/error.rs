//! Errors returned by the leaderboard service

use persistence::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    /// Bad client input; the message is shown to the client as-is
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Database(#[from] DbError),
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
