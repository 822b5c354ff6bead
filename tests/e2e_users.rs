//! E2E tests for the user directory

mod common;

use common::{TestServer, remote_id};
use mm_relay::data::Store;
use serde_json::Value;

#[tokio::test]
async fn test_users_excludes_requester() {
    let server = TestServer::new().await;
    let (token, _) = server.login("alice").await;

    let response = server.get("/api/users", &token).await;
    assert_eq!(response.status(), 200);

    let users: Vec<Value> = response.json().await.unwrap();
    let mut names: Vec<_> = users
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["bob", "carol"]);
    assert!(users.iter().all(|u| u["status"] == "offline"));
}

#[tokio::test]
async fn test_user_sync_is_idempotent() {
    let server = TestServer::new().await;
    let (token, _) = server.login("alice").await;

    let first: Vec<Value> = server.get("/api/users", &token).await.json().await.unwrap();
    let second: Vec<Value> = server.get("/api/users", &token).await.json().await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(server.state.store.list_users().len(), 3);
}

#[tokio::test]
async fn test_discovered_user_keeps_local_id_after_login() {
    let server = TestServer::new().await;
    let (alice, _) = server.login("alice").await;

    let users: Vec<Value> = server.get("/api/users", &alice).await.json().await.unwrap();
    let bob = users
        .iter()
        .find(|u| u["mattermostId"] == remote_id("bob").as_str())
        .unwrap()
        .clone();

    let (_, bob_login) = server.login("bob").await;
    assert_eq!(bob_login["id"], bob["id"]);
    assert_eq!(bob_login["status"], "online");
}
