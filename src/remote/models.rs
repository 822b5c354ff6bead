//! Remote API payloads
//!
//! Subset of the Mattermost v4 objects this relay reads. Unknown fields
//! are ignored; missing optional ones fall back to defaults.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Remote user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RemoteUser {
    /// First and last name, with the remote's empty strings as `None`
    pub fn names(&self) -> (Option<String>, Option<String>) {
        (non_empty(&self.first_name), non_empty(&self.last_name))
    }
}

/// Remote channel (only direct channels are used)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub channel_type: String,
}

/// Remote post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub create_at: i64,
    /// Milliseconds since the Unix epoch; 0 when never updated
    #[serde(default)]
    pub update_at: i64,
    pub user_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub props: serde_json::Value,
}

impl RemotePost {
    pub fn created_at(&self) -> DateTime<Utc> {
        millis_to_datetime(self.create_at)
    }

    /// `update_at`, or `create_at` when the remote left it zero
    pub fn updated_at(&self) -> DateTime<Utc> {
        if self.update_at > 0 {
            millis_to_datetime(self.update_at)
        } else {
            self.created_at()
        }
    }
}

/// One page of channel posts
///
/// `order` is not guaranteed to be chronological and may reference ids
/// missing from `posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    #[serde(default)]
    pub posts: HashMap<String, RemotePost>,
    #[serde(default)]
    pub order: Vec<String>,
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: RemoteUser,
    pub token: String,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}
