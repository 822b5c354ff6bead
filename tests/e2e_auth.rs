//! E2E tests for login, logout and session resolution

mod common;

use common::{TestServer, remote_id};
use serde_json::{Value, json};

#[tokio::test]
async fn test_login_returns_user_and_token() {
    let server = TestServer::new().await;

    let (token, user) = server.login("alice").await;

    assert!(!token.is_empty());
    assert_eq!(user["username"], "alice");
    assert_eq!(user["mattermostId"], remote_id("alice").as_str());
    assert_eq!(user["status"], "online");
    assert_eq!(user["firstName"], "ALICE");
    assert_eq!(user["lastName"], Value::Null);
    assert!(user.get("sessionToken").is_none());
}

#[tokio::test]
async fn test_login_with_bad_password_is_unauthorized() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({
            "username": "alice",
            "password": "wrong",
            "serverUrl": server.mattermost.url,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().starts_with("Login failed"));
}

#[tokio::test]
async fn test_login_validation() {
    let server = TestServer::new().await;

    for body in [
        json!({ "username": "alice", "password": "secret" }),
        json!({ "username": "", "password": "secret", "serverUrl": server.mattermost.url }),
        json!({ "username": "alice", "password": "secret", "serverUrl": "not a url" }),
    ] {
        let response = server
            .client
            .post(server.url("/api/auth/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body {body} should be rejected");
        let error: Value = response.json().await.unwrap();
        assert!(error["message"].is_string());
    }

    let malformed = server
        .client
        .post(server.url("/api/auth/login"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);
}

#[tokio::test]
async fn test_login_against_unreachable_server_is_upstream_error() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({
            "username": "alice",
            "password": "secret",
            "serverUrl": "http://127.0.0.1:9",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_me_requires_bearer() {
    let server = TestServer::new().await;

    let missing = server
        .client
        .get(server.url("/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 401);

    let unknown = server.get("/api/auth/me", "no-such-token").await;
    assert_eq!(unknown.status(), 401);
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let server = TestServer::new().await;
    let (token, user) = server.login("alice").await;

    let response = server.get("/api/auth/me", &token).await;

    assert_eq!(response.status(), 200);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let server = TestServer::new().await;
    let (token, _) = server.login("alice").await;

    let response = server.post("/api/auth/logout", &token, json!({})).await;
    assert_eq!(response.status(), 200);

    for path in ["/api/auth/me", "/api/users", "/api/direct-conversations"] {
        let response = server.get(path, &token).await;
        assert_eq!(response.status(), 401, "{path} accepted a logged-out token");
    }

    let again = server.post("/api/auth/logout", &token, json!({})).await;
    assert_eq!(again.status(), 401);
}

#[tokio::test]
async fn test_relogin_rebinds_session() {
    let server = TestServer::new().await;
    let (first, user) = server.login("alice").await;
    let (second, again) = server.login("alice").await;

    assert_ne!(first, second);
    assert_eq!(user["id"], again["id"]);

    assert_eq!(server.get("/api/auth/me", &first).await.status(), 401);
    assert_eq!(server.get("/api/auth/me", &second).await.status(), 200);

    // The rebound client still talks to the remote server.
    assert_eq!(server.get("/api/users", &second).await.status(), 200);
}

#[tokio::test]
async fn test_logout_with_superseded_token_keeps_new_session() {
    let server = TestServer::new().await;
    let (first, _) = server.login("alice").await;
    let (second, _) = server.login("alice").await;

    let stale = server.post("/api/auth/logout", &first, json!({})).await;
    assert_eq!(stale.status(), 401);

    assert_eq!(server.get("/api/auth/me", &second).await.status(), 200);
    assert_eq!(server.get("/api/users", &second).await.status(), 200);
}
