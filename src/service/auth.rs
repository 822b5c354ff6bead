//! Login and logout
//!
//! Owns the lifecycle of a session binding: a successful remote login
//! produces a local user carrying the remote token plus a bound client;
//! logout tears both down.

use std::sync::Arc;

use crate::auth::SessionRegistry;
use crate::config::UpstreamConfig;
use crate::data::{NewRemoteServer, NewUser, Store, StoreError, User, UserPatch, UserStatus};
use crate::error::AppError;
use crate::remote::{MattermostClient, RemoteChat, RemoteUser};

/// Authentication service
pub struct AuthService {
    store: Arc<dyn Store>,
    sessions: Arc<SessionRegistry>,
    http: reqwest::Client,
    upstream: UpstreamConfig,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        sessions: Arc<SessionRegistry>,
        http: reqwest::Client,
        upstream: UpstreamConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            http,
            upstream,
        }
    }

    /// Log in against the remote server at `server_url`
    ///
    /// Returns the refreshed local user and the session token the client
    /// must present as a bearer.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        server_url: &str,
    ) -> Result<(User, String), AppError> {
        let client = Arc::new(MattermostClient::new(
            self.http.clone(),
            server_url,
            &self.upstream.api_version,
        ));
        self.login_with(client, username, password, server_url).await
    }

    /// Log in through an already constructed remote client
    ///
    /// The binding is in place before the user record carries the new
    /// token, so a token that resolves always has a client.
    pub async fn login_with(
        &self,
        client: Arc<dyn RemoteChat>,
        username: &str,
        password: &str,
        server_url: &str,
    ) -> Result<(User, String), AppError> {
        let outcome = client.login(username, password).await?;
        let user = self.find_or_create(&outcome.user)?;

        self.sessions.bind(&user.id, client);

        let (first_name, last_name) = outcome.user.names();
        let user = self.store.update_user(
            &user.id,
            UserPatch {
                email: Some(outcome.user.email.clone()),
                first_name: Some(first_name),
                last_name: Some(last_name),
                status: Some(UserStatus::Online),
                session_token: Some(Some(outcome.token.clone())),
            },
        )?;

        self.ensure_server(server_url);

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok((user, outcome.token))
    }

    /// End the session of `user` that was authenticated with `token`
    /// through `client`
    ///
    /// Only that session is torn down. If the user has logged in again in
    /// the meantime, the newer token and binding stay in place.
    pub fn logout(
        &self,
        user: &User,
        token: &str,
        client: &Arc<dyn RemoteChat>,
    ) -> Result<(), AppError> {
        client.clear_token();
        let ended = self.store.end_session(&user.id, token)?;
        let unbound = self.sessions.unbind_if(&user.id, client);

        if ended && unbound {
            tracing::info!(user_id = %user.id, "User logged out");
        } else {
            tracing::info!(
                user_id = %user.id,
                token_cleared = ended,
                client_unbound = unbound,
                "Logged out a superseded session"
            );
        }
        Ok(())
    }

    fn find_or_create(&self, remote: &RemoteUser) -> Result<User, AppError> {
        if let Some(user) = self.store.get_user_by_remote_id(&remote.id) {
            return Ok(user);
        }

        let (first_name, last_name) = remote.names();
        let created = self.store.create_user(NewUser {
            remote_id: remote.id.clone(),
            username: remote.username.clone(),
            email: remote.email.clone(),
            first_name,
            last_name,
            status: UserStatus::Offline,
            session_token: None,
        });

        match created {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent create for the same remote id;
            // a username held by another remote id stays an error.
            Err(err @ StoreError::Duplicate { .. }) => self
                .store
                .get_user_by_remote_id(&remote.id)
                .ok_or(AppError::Store(err)),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_server(&self, server_url: &str) {
        if self.store.active_server().is_some() {
            return;
        }

        let server = NewRemoteServer {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_version: self.upstream.api_version.clone(),
            is_active: true,
        };
        match self.store.create_server(server) {
            Ok(server) => tracing::info!(server_url = %server.server_url, "Remote server recorded"),
            // Another login recorded it first.
            Err(e) => tracing::debug!(error = %e, "Remote server already recorded"),
        }
    }
}
