//! Session registry
//!
//! Maps a local user id to the authenticated remote client created at
//! login. Session tokens themselves live on the [`User`] record; the
//! registry only holds the live client side of the binding.

use std::sync::Arc;

use dashmap::DashMap;

use crate::data::{Store, User};
use crate::error::AppError;
use crate::metrics::SESSIONS_ACTIVE;
use crate::remote::RemoteChat;

/// Authoritative local user id → remote client mapping
pub struct SessionRegistry {
    store: Arc<dyn Store>,
    clients: DashMap<String, Arc<dyn RemoteChat>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clients: DashMap::new(),
        }
    }

    /// Bind `client` to `user_id`, replacing any prior binding
    pub fn bind(&self, user_id: &str, client: Arc<dyn RemoteChat>) {
        if let Some(previous) = self.clients.insert(user_id.to_string(), client) {
            // The replaced client may still be held by an in-flight request.
            previous.clear_token();
            tracing::debug!(user_id = %user_id, "Replaced existing session binding");
        }
        SESSIONS_ACTIVE.set(self.clients.len() as i64);
    }

    /// Resolve a bearer token to the user that currently owns it
    ///
    /// Linear scan over the store's users.
    pub fn resolve(&self, token: &str) -> Result<User, AppError> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        self.store
            .find_user_by_session_token(token)
            .ok_or(AppError::Unauthorized)
    }

    /// Client bound to `user_id`, if any
    pub fn client_for(&self, user_id: &str) -> Option<Arc<dyn RemoteChat>> {
        self.clients
            .get(user_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the binding for `user_id`; absent bindings are not an error
    pub fn unbind(&self, user_id: &str) -> Option<Arc<dyn RemoteChat>> {
        let removed = self.clients.remove(user_id).map(|(_, client)| client);
        SESSIONS_ACTIVE.set(self.clients.len() as i64);
        removed
    }

    /// Drop the binding for `user_id` only while it is still `client`
    ///
    /// A newer login may have rebound the user since `client` was looked
    /// up; that binding is left in place.
    pub fn unbind_if(&self, user_id: &str, client: &Arc<dyn RemoteChat>) -> bool {
        let removed = self
            .clients
            .remove_if(user_id, |_, bound| Arc::ptr_eq(bound, client))
            .is_some();
        SESSIONS_ACTIVE.set(self.clients.len() as i64);
        removed
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.clients.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
