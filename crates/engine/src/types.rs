//! Wire types served to leaderboard clients
//!
//! Field names are camelCase and ids are exposed as `_id`, which is what the
//! browser client reads.

use chrono::{DateTime, TimeZone, Utc};
use persistence::repository::{ClaimHistoryRow, UserRecord};
use serde::{Deserialize, Serialize};

/// A user as clients see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub total_points: i64,
    pub profile_image: String,
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            total_points: record.total_points,
            profile_image: record.profile_image,
        }
    }
}

/// One row of the ranked board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub user: UserView,
}

/// The user a history entry points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimantRef {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
}

/// A claim in the history feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: i64,
    /// `null` once the user is gone
    pub user_id: Option<ClaimantRef>,
    pub points: i64,
    pub claimed_at: DateTime<Utc>,
}

impl From<ClaimHistoryRow> for HistoryEntry {
    fn from(row: ClaimHistoryRow) -> Self {
        let user_id = match (row.user_id, row.user_name) {
            (Some(id), Some(name)) => Some(ClaimantRef { id, name }),
            _ => None,
        };
        Self {
            id: row.id,
            user_id,
            points: row.points,
            claimed_at: millis_to_datetime(row.claimed_at),
        }
    }
}

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub points_awarded: i64,
    pub updated_user: UserView,
}

/// Input for creating a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image: String,
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}
