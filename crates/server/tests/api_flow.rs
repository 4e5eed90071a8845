//! End-to-end tests against a live server on an ephemeral port

use engine::{ClaimOutcome, FixedPoints, HistoryEntry, LeaderboardEntry, LeaderboardService, UserView};
use futures_util::StreamExt;
use leaderboard_server::config::ServerConfig;
use leaderboard_server::uploads::UploadStore;
use leaderboard_server::{build_router, AppState};
use persistence::Database;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const AWARD: i64 = 5;

static NEXT_APP: AtomicUsize = AtomicUsize::new(0);

struct TestApp {
    addr: String,
    client: reqwest::Client,
    upload_dir: PathBuf,
    _db: Database,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn add_user(&self, name: &str) -> UserView {
        let resp = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    async fn claim(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/claim"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.upload_dir).ok();
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

async fn spawn_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let service = LeaderboardService::with_points(db.pool_clone(), Arc::new(FixedPoints(AWARD)));

    let upload_dir = std::env::temp_dir().join(format!(
        "leaderboard-e2e-{}-{}",
        std::process::id(),
        NEXT_APP.fetch_add(1, Ordering::Relaxed)
    ));
    let mut config = ServerConfig {
        db_path: PathBuf::from(":memory:"),
        upload_dir: upload_dir.clone(),
        static_dir: upload_dir.join("dist"),
        allowed_origins: Vec::new(),
        max_upload_bytes: 1024 * 1024,
        seed_on_start: false,
    };
    configure(&mut config);

    let state = AppState::new(service, UploadStore::new(&config.upload_dir));
    let app = build_router(state, &config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        upload_dir,
        _db: db,
    }
}

#[tokio::test]
async fn claim_flow_updates_board_and_history() {
    let app = spawn_app().await;
    let rahul = app.add_user("Rahul").await;
    let kamal = app.add_user("Kamal").await;

    let resp = app.claim(json!({ "userId": kamal.id })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: ClaimOutcome = resp.json().await.unwrap();
    assert_eq!(outcome.points_awarded, AWARD);
    assert_eq!(outcome.updated_user.id, kamal.id);
    assert_eq!(outcome.updated_user.total_points, AWARD);

    // String ids work too
    let resp = app.claim(json!({ "userId": kamal.id.to_string() })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let users: Vec<UserView> = app
        .client
        .get(app.url("/api/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, rahul.id);

    let board: Vec<LeaderboardEntry> = app
        .client
        .get(app.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].user.id, kamal.id);
    assert_eq!(board[0].user.total_points, 2 * AWARD);
    assert_eq!(board[1].rank, 2);
    assert_eq!(board[1].user.id, rahul.id);

    let history: Vec<HistoryEntry> = app
        .client
        .get(app.url("/api/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].id > history[1].id);
    assert_eq!(history[0].user_id.as_ref().unwrap().name, "Kamal");

    let limited: Vec<Value> = app
        .client
        .get(app.url("/api/history?limit=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0]["userId"]["name"], "Kamal");
}

#[tokio::test]
async fn bad_requests_get_json_errors() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "error": "Name required" }));

    let resp = app.claim(json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "error": "userId required" }));

    let resp = app.claim(json!({ "userId": 404 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "error": "User not found" }));

    let resp = app
        .client
        .patch(app.url("/api/users/not-an-id"))
        .json(&json!({ "profileImage": "https://example.com/a.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .client
        .get(app.url("/api/history?limit=-3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn avatar_upload_is_stored_and_served() {
    let app = spawn_app().await;
    let png = vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4];

    let form = reqwest::multipart::Form::new().text("name", "Priya").part(
        "profileImage",
        reqwest::multipart::Part::bytes(png.clone())
            .file_name("priya.PNG")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = app
        .client
        .post(app.url("/api/users"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let priya: UserView = resp.json().await.unwrap();
    assert!(priya.profile_image.starts_with("/uploads/images/profileImage-"));
    assert!(priya.profile_image.ends_with(".png"));

    let served = app
        .client
        .get(app.url(&priya.profile_image))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().to_vec(), png);

    // A text URL replaces the upload; an empty form clears it
    let form = reqwest::multipart::Form::new().text("profileImage", "https://example.com/p.png");
    let updated: UserView = app
        .client
        .patch(app.url(&format!("/api/users/{}", priya.id)))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.profile_image, "https://example.com/p.png");

    let cleared: UserView = app
        .client
        .patch(app.url(&format!("/api/users/{}", priya.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.profile_image, "");
}

#[tokio::test]
async fn push_channel_signals_each_write() {
    let app = spawn_app().await;
    let user = app.add_user("Neha").await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", app.addr))
        .await
        .unwrap();

    let health: Value = app
        .client
        .get(app.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["connectedClients"], 1);

    // A failed claim writes nothing and signals nothing
    let resp = app.claim(json!({ "userId": user.id + 1000 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.claim(json!({ "userId": user.id })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("refresh within timeout")
        .unwrap()
        .unwrap();
    assert_eq!(frame, Message::Text("leaderboardUpdate".into()));

    let extra = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(extra.is_err(), "only one refresh per write");

    app.add_user("Ravi").await;
    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("refresh after add")
        .unwrap()
        .unwrap();
    assert_eq!(frame, Message::Text("leaderboardUpdate".into()));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = spawn_app().await;
    let resp = app.client.get(app.url("/api/health")).send().await.unwrap();

    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(
        resp.headers()["referrer-policy"],
        "strict-origin-when-cross-origin"
    );
}

#[tokio::test]
async fn claim_without_a_usable_user_id_is_rejected() {
    let app = spawn_app().await;
    let expected = json!({ "error": "userId required" });

    let resp = app
        .client
        .post(app.url("/api/claim"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap(), expected);

    let resp = app
        .client
        .post(app.url("/api/claim"))
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap(), expected);

    let resp = app.claim(json!({ "userId": 0 })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap(), expected);
}

#[tokio::test]
async fn failed_avatar_write_leaves_no_file_behind() {
    let app = spawn_app().await;

    let form = reqwest::multipart::Form::new().part(
        "profileImage",
        reqwest::multipart::Part::bytes(vec![1, 2, 3, 4])
            .file_name("a.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = app
        .client
        .patch(app.url("/api/users/999"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let leftover = std::fs::read_dir(&app.upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let app = spawn_app_with(|config| config.max_upload_bytes = 16).await;

    let form = reqwest::multipart::Form::new().text("name", "Vikas").part(
        "profileImage",
        reqwest::multipart::Part::bytes(vec![7; 4096])
            .file_name("big.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = app
        .client
        .post(app.url("/api/users"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({ "error": "Upload too large" })
    );
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let app = spawn_app().await;
    let resp = app
        .client
        .get(app.url("/api/health"))
        .header("origin", "http://anywhere.test")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn cors_allows_only_configured_origins() {
    let app = spawn_app_with(|config| {
        config.allowed_origins = vec!["http://board.test".to_string()];
    })
    .await;

    let resp = app
        .client
        .get(app.url("/api/health"))
        .header("origin", "http://board.test")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "http://board.test");
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");

    let resp = app
        .client
        .get(app.url("/api/health"))
        .header("origin", "http://elsewhere.test")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
