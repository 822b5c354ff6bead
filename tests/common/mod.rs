//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod fake_mattermost;

use mm_relay::{AppState, config};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub use fake_mattermost::{FakeMattermost, direct_channel_id, remote_id};

/// Test server instance
///
/// Runs the relay on an ephemeral port in front of a fresh
/// [`FakeMattermost`].
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub mattermost: FakeMattermost,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let mattermost = FakeMattermost::start().await;

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_origins: Vec::new(),
            },
            upstream: config::UpstreamConfig {
                timeout_seconds: 5,
                user_agent: "mm-relay/test".to_string(),
                api_version: "v4".to_string(),
            },
            sync: config::SyncConfig {
                users_page_size: 200,
                posts_page_size: 60,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = mm_relay::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            client,
            mattermost,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Log `username` in through the relay; returns (token, user)
    pub async fn login(&self, username: &str) -> (String, Value) {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({
                "username": username,
                "password": "secret",
                "serverUrl": self.mattermost.url,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "login of {username} failed");

        let body: Value = response.json().await.unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (token, body["user"].clone())
    }

    /// GET with a bearer token
    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// POST JSON with a bearer token
    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}
