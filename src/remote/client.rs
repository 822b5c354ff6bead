//! Mattermost v4 HTTP client
//!
//! One instance per login. The bearer credential lives inside the
//! instance and is set only by a successful [`RemoteChat::login`].

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{LoginOutcome, PostList, RemoteChannel, RemotePost, RemoteUser};
use super::{RemoteChat, RemoteError};
use crate::metrics::{UPSTREAM_REQUESTS_TOTAL, UPSTREAM_REQUEST_DURATION_SECONDS};

/// Response header carrying the session token after login
const TOKEN_HEADER: &str = "Token";

/// Authenticated adapter over the remote chat server's HTTP API
pub struct MattermostClient {
    http: reqwest::Client,
    api_url: String,
    token: RwLock<Option<String>>,
}

impl MattermostClient {
    /// Create a client for `server_url`
    ///
    /// Trailing slashes are dropped; the API root is
    /// `<server_url>/api/<api_version>`. The shared `http` client carries
    /// the request timeout.
    pub fn new(http: reqwest::Client, server_url: &str, api_version: &str) -> Self {
        let base = server_url.trim_end_matches('/');
        Self {
            http,
            api_url: format!("{}/api/{}", base, api_version),
            token: RwLock::new(None),
        }
    }

    fn bearer(&self) -> Result<String, RemoteError> {
        self.token.read().clone().ok_or(RemoteError::NotAuthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Send an authenticated request and decode a JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
        failure: &str,
    ) -> Result<T, RemoteError> {
        let token = self.bearer()?;
        let response = dispatch(endpoint, request.bearer_auth(token), failure).await?;

        if !response.status().is_success() {
            return Err(RemoteError::Upstream(format!(
                "{}: HTTP {}",
                failure,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Upstream(format!("{}: invalid response body: {}", failure, e)))
    }
}

/// Issue a request, recording duration and outcome
async fn dispatch(
    endpoint: &'static str,
    request: RequestBuilder,
    failure: &str,
) -> Result<reqwest::Response, RemoteError> {
    let _timer = UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .start_timer();

    match request.send().await {
        Ok(response) => {
            UPSTREAM_REQUESTS_TOTAL
                .with_label_values(&[endpoint, response.status().as_str()])
                .inc();
            Ok(response)
        }
        Err(e) if e.is_timeout() => {
            UPSTREAM_REQUESTS_TOTAL
                .with_label_values(&[endpoint, "timeout"])
                .inc();
            Err(RemoteError::Timeout(format!("{}: request timed out", failure)))
        }
        Err(e) => {
            UPSTREAM_REQUESTS_TOTAL
                .with_label_values(&[endpoint, "error"])
                .inc();
            Err(RemoteError::Upstream(format!("{}: {}", failure, e)))
        }
    }
}

#[async_trait]
impl RemoteChat for MattermostClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, RemoteError> {
        let request = self.http.post(self.url("/users/login")).json(&serde_json::json!({
            "login_id": username,
            "password": password,
        }));
        let response = dispatch("users_login", request, "Login failed").await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Authentication(login_failure_message(status, &body)));
        }

        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                RemoteError::Authentication("No authentication token received".to_string())
            })?;

        let user = response
            .json::<RemoteUser>()
            .await
            .map_err(|e| RemoteError::Upstream(format!("Login failed: invalid user body: {}", e)))?;

        *self.token.write() = Some(token.clone());
        Ok(LoginOutcome { user, token })
    }

    async fn list_users(&self, page_size: u32) -> Result<Vec<RemoteUser>, RemoteError> {
        let request = self
            .http
            .get(self.url("/users"))
            .query(&[("per_page", page_size)]);
        self.send("users_list", request, "Failed to get users").await
    }

    async fn get_or_create_direct_channel(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<RemoteChannel, RemoteError> {
        let request = self
            .http
            .post(self.url("/channels/direct"))
            .json(&[user_a, user_b]);
        self.send("channels_direct", request, "Failed to create direct channel")
            .await
    }

    async fn list_channel_posts(
        &self,
        channel_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PostList, RemoteError> {
        let path = format!("/channels/{}/posts", urlencoding::encode(channel_id));
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("page", page), ("per_page", page_size)]);
        self.send("channel_posts", request, "Failed to get channel posts")
            .await
    }

    async fn create_post(&self, channel_id: &str, text: &str) -> Result<RemotePost, RemoteError> {
        let request = self.http.post(self.url("/posts")).json(&serde_json::json!({
            "channel_id": channel_id,
            "message": text,
        }));
        self.send("posts_create", request, "Failed to create post").await
    }

    fn clear_token(&self) {
        *self.token.write() = None;
    }
}

fn login_failure_message(status: StatusCode, body: &str) -> String {
    // Mattermost error bodies carry a human readable `message`.
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_string());

    if detail.is_empty() {
        format!("Login failed: HTTP {}", status)
    } else {
        format!("Login failed: {}", detail)
    }
}
