//! Minimal Mattermost v4 server for E2E tests
//!
//! Serves the handful of endpoints the relay calls, keeps everything in
//! memory and counts direct channel creations so tests can assert on
//! remote traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone)]
struct Account {
    id: String,
    username: String,
    password: String,
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    /// token → remote user id
    tokens: Mutex<HashMap<String, String>>,
    /// channel id → posts, oldest first
    posts: Mutex<HashMap<String, Vec<Value>>>,
    issued: AtomicUsize,
    direct_channel_calls: AtomicUsize,
    post_counter: AtomicUsize,
}

/// Handle to a running fake server
pub struct FakeMattermost {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeMattermost {
    /// Start with accounts alice/bob/carol, all with password "secret"
    pub async fn start() -> Self {
        let accounts = ["alice", "bob", "carol"]
            .into_iter()
            .map(|name| Account {
                id: remote_id(name),
                username: name.to_string(),
                password: "secret".to_string(),
            })
            .collect();

        let state = Arc::new(FakeState {
            accounts,
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/v4/users/login", post(login))
            .route("/api/v4/users", get(list_users))
            .route("/api/v4/channels/direct", post(create_direct_channel))
            .route("/api/v4/channels/:channel_id/posts", get(channel_posts))
            .route("/api/v4/posts", post(create_post))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Number of `POST /channels/direct` calls received
    pub fn direct_channel_calls(&self) -> usize {
        self.state.direct_channel_calls.load(Ordering::SeqCst)
    }

    /// Insert a post directly, bypassing the relay
    pub fn seed_post(&self, channel_id: &str, post_id: &str, create_at: i64, author: &str) {
        self.state
            .posts
            .lock()
            .entry(channel_id.to_string())
            .or_default()
            .push(json!({
                "id": post_id,
                "create_at": create_at,
                "update_at": 0,
                "user_id": remote_id(author),
                "channel_id": channel_id,
                "message": format!("seeded {post_id}"),
                "props": {},
            }));
    }
}

/// Remote id the fake assigns to `username`
pub fn remote_id(username: &str) -> String {
    format!("mm-{username}")
}

/// Channel id the fake assigns to a direct pair
pub fn direct_channel_id(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort();
    format!("{}__{}", pair[0], pair[1])
}

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "username": account.username,
        "email": format!("{}@example.com", account.username),
        "first_name": account.username.to_uppercase(),
        "last_name": "",
        "roles": "system_user",
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn caller(state: &FakeState, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.tokens.lock().get(token).cloned()
}

#[derive(Deserialize)]
struct LoginBody {
    login_id: String,
    password: String,
}

async fn login(State(state): State<Arc<FakeState>>, Json(body): Json<LoginBody>) -> Response {
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.username == body.login_id && a.password == body.password)
    else {
        return error(
            StatusCode::UNAUTHORIZED,
            "Enter a valid email or username and/or password.",
        );
    };

    let n = state.issued.fetch_add(1, Ordering::SeqCst);
    let token = format!("token-{}-{}", account.username, n);
    state
        .tokens
        .lock()
        .insert(token.clone(), account.id.clone());

    ([("Token", token)], Json(user_json(account))).into_response()
}

#[derive(Deserialize)]
struct PageParams {
    #[serde(default)]
    per_page: Option<usize>,
}

async fn list_users(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Response {
    if caller(&state, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    }
    let limit = params.per_page.unwrap_or(60);
    let users: Vec<Value> = state.accounts.iter().take(limit).map(user_json).collect();
    Json(users).into_response()
}

async fn create_direct_channel(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(pair): Json<Vec<String>>,
) -> Response {
    if caller(&state, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    }
    if pair.len() != 2 {
        return error(StatusCode::BAD_REQUEST, "Expected two user ids");
    }
    state.direct_channel_calls.fetch_add(1, Ordering::SeqCst);

    let id = direct_channel_id(&pair[0], &pair[1]);
    Json(json!({ "id": id, "name": id, "type": "D" })).into_response()
}

async fn channel_posts(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(channel_id): Path<String>,
) -> Response {
    if caller(&state, &headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    }

    let posts = state
        .posts
        .lock()
        .get(&channel_id)
        .cloned()
        .unwrap_or_default();

    // Newest first, like the real server.
    let order: Vec<Value> = posts.iter().rev().map(|p| p["id"].clone()).collect();
    let by_id: serde_json::Map<String, Value> = posts
        .into_iter()
        .map(|p| (p["id"].as_str().unwrap_or_default().to_string(), p))
        .collect();

    Json(json!({ "order": order, "posts": by_id })).into_response()
}

#[derive(Deserialize)]
struct CreatePostBody {
    channel_id: String,
    message: String,
}

async fn create_post(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<CreatePostBody>,
) -> Response {
    let Some(author) = caller(&state, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired session");
    };

    let n = state.post_counter.fetch_add(1, Ordering::SeqCst);
    let post = json!({
        "id": format!("sent-{n}"),
        "create_at": chrono::Utc::now().timestamp_millis(),
        "update_at": 0,
        "user_id": author,
        "channel_id": body.channel_id,
        "message": body.message,
        "props": {},
    });
    state
        .posts
        .lock()
        .entry(body.channel_id)
        .or_default()
        .push(post.clone());

    (StatusCode::CREATED, Json(post)).into_response()
}
