//! API layer
//!
//! HTTP handlers for:
//! - Auth (login, logout, current user)
//! - Users, direct conversations and messages
//! - Remote server record
//! - Metrics (Prometheus)

mod auth;
mod conversations;
mod dto;
mod messages;
pub mod metrics;
mod server;
mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use dto::*;

pub use auth::auth_router;
pub use metrics::metrics_router;

/// Create the REST router mounted under `/api`
///
/// Only login and the server record are public; every other route
/// extracts [`crate::auth::CurrentUser`].
pub fn relay_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_router())
        .route("/server", get(server::active_server))
        .route("/users", get(users::list_users))
        .route(
            "/direct-conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/channels/:channel_id/messages",
            get(messages::channel_messages),
        )
        .route("/messages", post(messages::send_message))
}
