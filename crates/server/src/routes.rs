//! REST handlers under `/api`

use crate::error::ApiError;
use crate::uploads::ProfileForm;
use crate::{AppState, APP_VERSION};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use engine::{ClaimOutcome, HistoryEntry, LeaderboardEntry, NewUser, UserView};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// `userId` as sent by clients: a number, or the id as a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserIdInput {
    Number(i64),
    Text(String),
}

impl UserIdInput {
    fn resolve(self) -> Result<i64, ApiError> {
        match self {
            UserIdInput::Number(0) => Err(ApiError::BadRequest("userId required".into())),
            UserIdInput::Number(id) => Ok(id),
            UserIdInput::Text(text) if text.trim().is_empty() => {
                Err(ApiError::BadRequest("userId required".into()))
            }
            UserIdInput::Text(text) => parse_user_id(&text),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    #[serde(default)]
    pub user_id: Option<UserIdInput>,
}

impl ClaimRequest {
    /// An absent or blank body reads as `{}`
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {err}")))
    }
}

/// Ids that can't be parsed can't exist either
fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::NotFound("User not found".into()))
}

/// GET /api/health
pub async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leaderboard",
        "version": APP_VERSION,
        "connectedClients": state.service.connected_clients(),
    }))
}

/// GET /api/users
pub async fn api_list_users(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, ApiError> {
    Ok(Json(state.service.list_users().await?))
}

/// POST /api/users: multipart or JSON `{name, profileImage}`
pub async fn api_add_user(
    State(state): State<AppState>,
    form: ProfileForm,
) -> Result<Json<UserView>, ApiError> {
    let name = form.name.clone().unwrap_or_default();
    if name.trim().is_empty() {
        // Reject before an uploaded file is written
        return Err(ApiError::BadRequest("Name required".into()));
    }

    let profile_image = state.uploads.resolve_image(&form).await?;
    let result = state
        .service
        .add_user(NewUser {
            name,
            profile_image: profile_image.clone(),
        })
        .await;
    if result.is_err() && form.image_file.is_some() {
        state.uploads.discard(&profile_image).await;
    }
    Ok(Json(result?))
}

/// PATCH /api/users/:id: replace the avatar; an empty form clears it
pub async fn api_update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: ProfileForm,
) -> Result<Json<UserView>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let profile_image = state.uploads.resolve_image(&form).await?;
    let result = state
        .service
        .update_profile_image(user_id, &profile_image)
        .await;
    if result.is_err() && form.image_file.is_some() {
        state.uploads.discard(&profile_image).await;
    }
    Ok(Json(result?))
}

/// POST /api/claim: `{userId}`
pub async fn api_claim(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClaimOutcome>, ApiError> {
    let request = ClaimRequest::from_body(&body)?;
    let user_id = request
        .user_id
        .ok_or_else(|| ApiError::BadRequest("userId required".into()))?
        .resolve()?;

    let outcome = state.service.claim(user_id).await?;
    debug!(user_id, points = outcome.points_awarded, "Claim served");
    Ok(Json(outcome))
}

/// GET /api/leaderboard
pub async fn api_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    Ok(Json(state.service.leaderboard().await?))
}

/// GET /api/history: newest first, optional `?limit=N`
pub async fn api_history(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let limit = match params.get("limit") {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n >= 0 => Some(n),
            _ => {
                return Err(ApiError::BadRequest(
                    "limit must be a non-negative integer".into(),
                ))
            }
        },
        None => None,
    };

    Ok(Json(state.service.history(limit).await?))
}
