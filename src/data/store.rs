//! Local store
//!
//! Volatile keyed collections for users, direct conversations, messages
//! and remote server records. The reconciler only sees the [`Store`]
//! trait so another backing can be swapped in without touching it.
//!
//! Every collection sits behind its own mutex together with its unique
//! indexes. Creates re-check the unique keys under that lock, which is
//! what keeps concurrent syncs from inserting duplicate rows.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;

use super::models::{
    DirectConversation, DirectConversationPatch, EntityId, Message, NewDirectConversation,
    NewMessage, NewRemoteServer, NewUser, RemoteServer, User, UserPatch, UserStatus,
};

/// Store constraint errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique key is already taken
    #[error("duplicate {collection} key: {key}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    /// Update target does not exist
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },
}

/// Storage contract used by the session and sync layers
///
/// All operations are synchronous and atomic per call. `create_*` always
/// assigns a fresh local id and fails only on a unique-key violation;
/// callers check for existence first.
pub trait Store: Send + Sync {
    // Users
    fn get_user(&self, id: &str) -> Option<User>;
    fn get_user_by_username(&self, username: &str) -> Option<User>;
    fn get_user_by_remote_id(&self, remote_id: &str) -> Option<User>;
    /// Linear scan over users; callers must not assume O(1).
    fn find_user_by_session_token(&self, token: &str) -> Option<User>;
    fn list_users(&self) -> Vec<User>;
    fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, StoreError>;
    /// Clear the session token and mark the user offline, but only while
    /// the stored token still equals `token`. Returns whether it did.
    fn end_session(&self, id: &str, token: &str) -> Result<bool, StoreError>;

    // Direct conversations
    fn get_direct_conversation_by_channel(&self, channel_id: &str) -> Option<DirectConversation>;
    fn list_direct_conversations_for(&self, remote_user_id: &str) -> Vec<DirectConversation>;
    fn create_direct_conversation(
        &self,
        conversation: NewDirectConversation,
    ) -> Result<DirectConversation, StoreError>;
    fn update_direct_conversation(
        &self,
        id: &str,
        patch: DirectConversationPatch,
    ) -> Result<DirectConversation, StoreError>;

    // Messages
    fn get_message_by_remote_id(&self, remote_id: &str) -> Option<Message>;
    fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    // Remote servers
    fn active_server(&self) -> Option<RemoteServer>;
    fn create_server(&self, server: NewRemoteServer) -> Result<RemoteServer, StoreError>;
}

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<String, User>,
    by_remote_id: HashMap<String, String>,
    by_username: HashMap<String, String>,
}

#[derive(Default)]
struct ConversationTable {
    rows: BTreeMap<String, DirectConversation>,
    by_pair: HashMap<(String, String), String>,
}

#[derive(Default)]
struct MessageTable {
    rows: HashMap<String, Message>,
    by_remote_id: HashMap<String, String>,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn record_size(collection: &str, size: usize) {
    use crate::metrics::STORE_RECORDS;
    STORE_RECORDS
        .with_label_values(&[collection])
        .set(size as i64);
}

/// In-memory store (volatile, cleared on restart)
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<UserTable>,
    conversations: Mutex<ConversationTable>,
    messages: Mutex<MessageTable>,
    servers: Mutex<Vec<RemoteServer>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get_user(&self, id: &str) -> Option<User> {
        self.users.lock().rows.get(id).cloned()
    }

    fn get_user_by_username(&self, username: &str) -> Option<User> {
        let users = self.users.lock();
        users
            .by_username
            .get(username)
            .and_then(|id| users.rows.get(id))
            .cloned()
    }

    fn get_user_by_remote_id(&self, remote_id: &str) -> Option<User> {
        let users = self.users.lock();
        users
            .by_remote_id
            .get(remote_id)
            .and_then(|id| users.rows.get(id))
            .cloned()
    }

    fn find_user_by_session_token(&self, token: &str) -> Option<User> {
        self.users
            .lock()
            .rows
            .values()
            .find(|user| user.session_token.as_deref() == Some(token))
            .cloned()
    }

    fn list_users(&self) -> Vec<User> {
        self.users.lock().rows.values().cloned().collect()
    }

    fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock();

        if users.by_remote_id.contains_key(&new.remote_id) {
            return Err(StoreError::Duplicate {
                collection: "users",
                key: new.remote_id,
            });
        }
        if users.by_username.contains_key(&new.username) {
            return Err(StoreError::Duplicate {
                collection: "users",
                key: new.username,
            });
        }

        let user = User {
            id: EntityId::new().0,
            remote_id: new.remote_id,
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            avatar: None,
            status: new.status,
            session_token: new.session_token,
            refresh_token: None,
            created_at: Utc::now(),
        };

        users
            .by_remote_id
            .insert(user.remote_id.clone(), user.id.clone());
        users
            .by_username
            .insert(user.username.clone(), user.id.clone());
        users.rows.insert(user.id.clone(), user.clone());
        record_size("users", users.rows.len());

        Ok(user)
    }

    fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users.lock();
        let user = users.rows.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: "users",
            id: id.to_string(),
        })?;
        patch.apply(user);
        Ok(user.clone())
    }

    fn end_session(&self, id: &str, token: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock();
        let user = users.rows.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: "users",
            id: id.to_string(),
        })?;
        if user.session_token.as_deref() != Some(token) {
            return Ok(false);
        }
        user.session_token = None;
        user.status = UserStatus::Offline;
        Ok(true)
    }

    fn get_direct_conversation_by_channel(&self, channel_id: &str) -> Option<DirectConversation> {
        self.conversations
            .lock()
            .rows
            .values()
            .find(|dm| dm.channel_id == channel_id)
            .cloned()
    }

    fn list_direct_conversations_for(&self, remote_user_id: &str) -> Vec<DirectConversation> {
        self.conversations
            .lock()
            .rows
            .values()
            .filter(|dm| dm.involves(remote_user_id))
            .cloned()
            .collect()
    }

    fn create_direct_conversation(
        &self,
        new: NewDirectConversation,
    ) -> Result<DirectConversation, StoreError> {
        let mut conversations = self.conversations.lock();

        let key = pair_key(&new.user_id_1, &new.user_id_2);
        if conversations.by_pair.contains_key(&key) {
            return Err(StoreError::Duplicate {
                collection: "direct_conversations",
                key: format!("{}:{}", key.0, key.1),
            });
        }

        let conversation = DirectConversation {
            id: EntityId::new().0,
            channel_id: new.channel_id,
            user_id_1: new.user_id_1,
            user_id_2: new.user_id_2,
            last_message_at: new.last_message_at,
            unread_count: new.unread_count,
        };

        conversations.by_pair.insert(key, conversation.id.clone());
        conversations
            .rows
            .insert(conversation.id.clone(), conversation.clone());
        record_size("direct_conversations", conversations.rows.len());

        Ok(conversation)
    }

    fn update_direct_conversation(
        &self,
        id: &str,
        patch: DirectConversationPatch,
    ) -> Result<DirectConversation, StoreError> {
        let mut conversations = self.conversations.lock();
        let conversation = conversations
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "direct_conversations",
                id: id.to_string(),
            })?;

        if let Some(last_message_at) = patch.last_message_at {
            conversation.last_message_at = Some(last_message_at);
        }
        if let Some(unread_count) = patch.unread_count {
            conversation.unread_count = unread_count;
        }

        Ok(conversation.clone())
    }

    fn get_message_by_remote_id(&self, remote_id: &str) -> Option<Message> {
        let messages = self.messages.lock();
        messages
            .by_remote_id
            .get(remote_id)
            .and_then(|id| messages.rows.get(id))
            .cloned()
    }

    fn create_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        let mut messages = self.messages.lock();

        if messages.by_remote_id.contains_key(&new.remote_id) {
            return Err(StoreError::Duplicate {
                collection: "messages",
                key: new.remote_id,
            });
        }

        let message = Message {
            id: EntityId::new().0,
            remote_id: new.remote_id,
            channel_id: new.channel_id,
            user_id: new.user_id,
            content: new.content,
            kind: new.kind,
            metadata: new.metadata,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };

        messages
            .by_remote_id
            .insert(message.remote_id.clone(), message.id.clone());
        messages.rows.insert(message.id.clone(), message.clone());
        record_size("messages", messages.rows.len());

        Ok(message)
    }

    fn active_server(&self) -> Option<RemoteServer> {
        self.servers
            .lock()
            .iter()
            .find(|server| server.is_active)
            .cloned()
    }

    fn create_server(&self, new: NewRemoteServer) -> Result<RemoteServer, StoreError> {
        let mut servers = self.servers.lock();

        if new.is_active && servers.iter().any(|server| server.is_active) {
            return Err(StoreError::Duplicate {
                collection: "remote_servers",
                key: new.server_url,
            });
        }

        let server = RemoteServer {
            id: EntityId::new().0,
            server_url: new.server_url,
            api_version: new.api_version,
            is_active: new.is_active,
        };
        servers.push(server.clone());

        Ok(server)
    }
}
