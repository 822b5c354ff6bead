//! Sync reconciler
//!
//! Pulls remote state through a [`RemoteChat`] client and merges it into
//! the local [`Store`], keyed by remote ids. Each create commits on its
//! own; a failed remote call aborts the operation without rolling back
//! earlier creates, and a retry skips what already exists.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::config::SyncConfig;
use crate::data::{
    DirectConversation, DirectConversationPatch, Message, MessageKind, NewDirectConversation,
    NewMessage, NewUser, Store, StoreError, User, UserStatus,
};
use crate::error::AppError;
use crate::metrics::SYNC_RECORDS_CREATED_TOTAL;
use crate::remote::{RemoteChat, RemotePost, RemoteUser};

/// Direct conversation with the other participant joined in
///
/// `other_user` is resolved at read time and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: DirectConversation,
    pub other_user: Option<User>,
}

/// Message with its author joined in
///
/// `user` is `None` when the author was never synced locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub user: Option<User>,
}

/// Remote → local reconciliation
pub struct SyncReconciler {
    store: Arc<dyn Store>,
    sync: SyncConfig,
}

impl SyncReconciler {
    pub fn new(store: Arc<dyn Store>, sync: SyncConfig) -> Self {
        Self { store, sync }
    }

    /// Mirror remote users locally
    ///
    /// Users not yet known by remote id are created `offline`; existing
    /// ones are left as they are. Returns every local user except the
    /// requester.
    pub async fn sync_users(
        &self,
        requester: &User,
        client: &dyn RemoteChat,
    ) -> Result<Vec<User>, AppError> {
        let remote_users = client.list_users(self.sync.users_page_size).await?;
        tracing::debug!(count = remote_users.len(), "Fetched remote users");

        for remote in &remote_users {
            if remote.id == requester.remote_id {
                continue;
            }
            if self.store.get_user_by_remote_id(&remote.id).is_some() {
                continue;
            }
            self.create_discovered_user(remote)?;
        }

        Ok(self
            .store
            .list_users()
            .into_iter()
            .filter(|user| user.id != requester.id)
            .collect())
    }

    fn create_discovered_user(&self, remote: &RemoteUser) -> Result<(), AppError> {
        let (first_name, last_name) = remote.names();
        let new = NewUser {
            remote_id: remote.id.clone(),
            username: remote.username.clone(),
            email: remote.email.clone(),
            first_name,
            last_name,
            status: UserStatus::Offline,
            session_token: None,
        };

        match self.store.create_user(new) {
            Ok(user) => {
                SYNC_RECORDS_CREATED_TOTAL.with_label_values(&["users"]).inc();
                tracing::debug!(user_id = %user.id, remote_id = %user.remote_id, "Discovered remote user");
                Ok(())
            }
            // A concurrent sync created the same remote user first.
            Err(StoreError::Duplicate { .. })
                if self.store.get_user_by_remote_id(&remote.id).is_some() =>
            {
                Ok(())
            }
            Err(StoreError::Duplicate { key, .. }) => {
                tracing::warn!(
                    remote_id = %remote.id,
                    username = %key,
                    "Username already taken by another remote user; skipping"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Direct conversations the requester takes part in
    pub fn list_conversations(&self, requester: &User) -> Vec<ConversationView> {
        self.store
            .list_direct_conversations_for(&requester.remote_id)
            .into_iter()
            .map(|conversation| self.view_conversation(conversation, &requester.remote_id))
            .collect()
    }

    /// Find or create the direct conversation with `other_remote_id`
    ///
    /// An existing local record for the pair is returned without any
    /// remote call.
    pub async fn open_conversation(
        &self,
        requester: &User,
        client: &dyn RemoteChat,
        other_remote_id: &str,
    ) -> Result<ConversationView, AppError> {
        if self.store.get_user_by_remote_id(other_remote_id).is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        if let Some(existing) = self.find_conversation(&requester.remote_id, other_remote_id) {
            return Ok(self.view_conversation(existing, &requester.remote_id));
        }

        let channel = client
            .get_or_create_direct_channel(&requester.remote_id, other_remote_id)
            .await?;

        let created = self.store.create_direct_conversation(NewDirectConversation {
            channel_id: channel.id.clone(),
            user_id_1: requester.remote_id.clone(),
            user_id_2: other_remote_id.to_string(),
            last_message_at: Some(Utc::now()),
            unread_count: "0".to_string(),
        });

        let conversation = match created {
            Ok(conversation) => {
                SYNC_RECORDS_CREATED_TOTAL
                    .with_label_values(&["direct_conversations"])
                    .inc();
                tracing::info!(
                    conversation_id = %conversation.id,
                    channel_id = %conversation.channel_id,
                    "Direct conversation created"
                );
                conversation
            }
            Err(StoreError::Duplicate { .. }) => self
                .find_conversation(&requester.remote_id, other_remote_id)
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "direct conversation vanished after duplicate insert"
                    ))
                })?,
            Err(e) => return Err(e.into()),
        };

        Ok(self.view_conversation(conversation, &requester.remote_id))
    }

    fn find_conversation(&self, a: &str, b: &str) -> Option<DirectConversation> {
        self.store
            .list_direct_conversations_for(a)
            .into_iter()
            .find(|dm| dm.is_between(a, b))
    }

    fn view_conversation(
        &self,
        conversation: DirectConversation,
        requester_remote_id: &str,
    ) -> ConversationView {
        let other_user = self
            .store
            .get_user_by_remote_id(conversation.other_participant(requester_remote_id));
        ConversationView {
            conversation,
            other_user,
        }
    }

    /// Mirror one page of channel posts and return them oldest first
    pub async fn sync_channel_messages(
        &self,
        client: &dyn RemoteChat,
        channel_id: &str,
    ) -> Result<Vec<MessageView>, AppError> {
        let mut page = client
            .list_channel_posts(channel_id, 0, self.sync.posts_page_size)
            .await?;

        let mut views = Vec::with_capacity(page.order.len());
        for post_id in &page.order {
            let Some(post) = page.posts.remove(post_id) else {
                tracing::warn!(
                    channel_id = %channel_id,
                    post_id = %post_id,
                    "Post listed in order but missing from posts map; skipping"
                );
                continue;
            };

            let message = self.mirror_post(post)?;
            let user = self.store.get_user_by_remote_id(&message.user_id);
            views.push(MessageView { message, user });
        }

        // The remote order array is not guaranteed to be chronological.
        views.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        Ok(views)
    }

    /// Existing local message for `post`, or a newly created one
    fn mirror_post(&self, post: RemotePost) -> Result<Message, AppError> {
        if let Some(existing) = self.store.get_message_by_remote_id(&post.id) {
            return Ok(existing);
        }

        let remote_id = post.id.clone();
        match self.store.create_message(new_message(post)) {
            Ok(message) => {
                SYNC_RECORDS_CREATED_TOTAL
                    .with_label_values(&["messages"])
                    .inc();
                Ok(message)
            }
            Err(StoreError::Duplicate { .. }) => self
                .store
                .get_message_by_remote_id(&remote_id)
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "message {remote_id} vanished after duplicate insert"
                    ))
                }),
            Err(e) => Err(e.into()),
        }
    }

    /// Publish a post and mirror it as one local message
    pub async fn send_message(
        &self,
        requester: &User,
        client: &dyn RemoteChat,
        channel_id: &str,
        content: &str,
    ) -> Result<MessageView, AppError> {
        let post = client.create_post(channel_id, content).await?;
        let message = self.mirror_post(post)?;

        if let Some(conversation) = self.store.get_direct_conversation_by_channel(channel_id) {
            self.store.update_direct_conversation(
                &conversation.id,
                DirectConversationPatch {
                    last_message_at: Some(message.created_at),
                    ..Default::default()
                },
            )?;
        }

        tracing::info!(
            user_id = %requester.id,
            channel_id = %channel_id,
            message_id = %message.id,
            "Message sent"
        );

        Ok(MessageView {
            message,
            user: Some(requester.clone()),
        })
    }
}

fn new_message(post: RemotePost) -> NewMessage {
    let created_at = post.created_at();
    let updated_at = post.updated_at();
    NewMessage {
        remote_id: post.id,
        channel_id: post.channel_id,
        user_id: post.user_id,
        content: post.message,
        kind: MessageKind::Text,
        metadata: post.props,
        created_at,
        updated_at,
    }
}
