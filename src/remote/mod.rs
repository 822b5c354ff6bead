//! Remote chat server adapter
//!
//! [`RemoteChat`] is the seam between the relay and the Mattermost HTTP
//! API. [`MattermostClient`] is the production implementation; unit tests
//! substitute a generated mock.

mod client;
mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use client::MattermostClient;
pub use models::{LoginOutcome, PostList, RemoteChannel, RemotePost, RemoteUser};

/// Failures talking to the remote chat server
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// Login rejected or no token returned
    #[error("{0}")]
    Authentication(String),

    /// Call attempted before a successful login
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Transport failure or non-2xx response
    #[error("{0}")]
    Upstream(String),

    /// Call exceeded the configured timeout
    #[error("{0}")]
    Timeout(String),
}

/// Operations the relay needs from the remote chat server
///
/// Every method except `login` requires the credential obtained by a
/// prior successful `login` on the same instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteChat: Send + Sync {
    /// Authenticate and remember the returned session token
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, RemoteError>;

    /// First page of remote users
    async fn list_users(&self, page_size: u32) -> Result<Vec<RemoteUser>, RemoteError>;

    /// Direct channel between two remote users (created if absent, idempotent remotely)
    async fn get_or_create_direct_channel(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<RemoteChannel, RemoteError>;

    /// One page of posts for a channel
    async fn list_channel_posts(
        &self,
        channel_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PostList, RemoteError>;

    /// Publish a text post
    async fn create_post(&self, channel_id: &str, text: &str) -> Result<RemotePost, RemoteError>;

    /// Forget the session token; later calls fail with `NotAuthenticated`
    fn clear_token(&self);
}
