//! Data models
//!
//! Local mirrors of remote chat state. All records use ULID local ids
//! and chrono timestamps; remote ids are kept verbatim as dedup keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// Presence status of a user
///
/// Only the currently authenticated user's status is known precisely;
/// users discovered through sync stay `Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
    Away,
    Dnd,
}

/// Local identity mirroring a remote account
///
/// Exactly one local user exists per remote id. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Remote (Mattermost) user id, immutable once set
    #[serde(rename = "mattermostId")]
    pub remote_id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub status: UserStatus,
    /// Bearer token of the current login; never sent to clients
    #[serde(skip_serializing, default)]
    pub session_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub remote_id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: UserStatus,
    pub session_token: Option<String>,
}

/// Partial update of a user
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub status: Option<UserStatus>,
    pub session_token: Option<Option<String>>,
}

impl UserPatch {
    pub(crate) fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(session_token) = self.session_token {
            user.session_token = session_token;
        }
    }
}

// =============================================================================
// Direct Conversation
// =============================================================================

/// Local record of a 1:1 channel
///
/// At most one record exists per unordered pair of participant remote ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectConversation {
    pub id: String,
    /// Remote channel id
    pub channel_id: String,
    /// Participant remote ids; order carries no meaning
    #[serde(rename = "userId1")]
    pub user_id_1: String,
    #[serde(rename = "userId2")]
    pub user_id_2: String,
    pub last_message_at: Option<DateTime<Utc>>,
    /// String-encoded non-negative integer
    pub unread_count: String,
}

impl DirectConversation {
    /// Whether `remote_id` is one of the two participants
    pub fn involves(&self, remote_id: &str) -> bool {
        self.user_id_1 == remote_id || self.user_id_2 == remote_id
    }

    /// Whether this conversation is between `a` and `b`, in either order
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.user_id_1 == a && self.user_id_2 == b) || (self.user_id_1 == b && self.user_id_2 == a)
    }

    /// The participant that is not `remote_id`
    pub fn other_participant(&self, remote_id: &str) -> &str {
        if self.user_id_1 == remote_id {
            &self.user_id_2
        } else {
            &self.user_id_1
        }
    }
}

/// Fields required to create a direct conversation
#[derive(Debug, Clone)]
pub struct NewDirectConversation {
    pub channel_id: String,
    pub user_id_1: String,
    pub user_id_2: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: String,
}

/// Partial update of a direct conversation
#[derive(Debug, Clone, Default)]
pub struct DirectConversationPatch {
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: Option<String>,
}

// =============================================================================
// Message
// =============================================================================

/// Kind of message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
}

/// Local mirror of a remote post
///
/// Exactly one local message exists per remote post id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Remote post id
    #[serde(rename = "mattermostId")]
    pub remote_id: String,
    pub channel_id: String,
    /// Author remote id
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Opaque remote `props` blob
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub remote_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub content: String,
    pub kind: MessageKind,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Remote Server
// =============================================================================

/// Remote chat server this relay has logged in against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteServer {
    pub id: String,
    pub server_url: String,
    pub api_version: String,
    pub is_active: bool,
}

/// Fields required to record a remote server
#[derive(Debug, Clone)]
pub struct NewRemoteServer {
    pub server_url: String,
    pub api_version: String,
    pub is_active: bool,
}
