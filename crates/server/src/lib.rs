//! Leaderboard HTTP server: REST API, WebSocket push channel and static files

pub mod config;
pub mod error;
pub mod push;
pub mod routes;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use crate::config::ServerConfig;
use crate::uploads::{UploadStore, UPLOADS_ROUTE};
use engine::LeaderboardService;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeaderboardService>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(service: LeaderboardService, uploads: UploadStore) -> Self {
        Self {
            service: Arc::new(service),
            uploads: Arc::new(uploads),
        }
    }
}

/// Full application: `/api`, `/ws`, uploaded avatars and the client bundle
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(routes::api_health))
        .route(
            "/users",
            get(routes::api_list_users).post(routes::api_add_user),
        )
        .route("/users/:id", patch(routes::api_update_user))
        .route("/claim", post(routes::api_claim))
        .route("/leaderboard", get(routes::api_leaderboard))
        .route("/history", get(routes::api_history))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    let uploads_dir = state.uploads.dir().to_path_buf();

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(push::ws_handler))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(uploads_dir))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones (with credentials)
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
