//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the local store, the session registry and the
//! remote chat client.

mod auth;
mod reconciler;

pub use auth::AuthService;
pub use reconciler::{ConversationView, MessageView, SyncReconciler};
