//! Authentication extractor
//!
//! Protects routes that need a logged-in user with a live remote session.

use std::sync::Arc;

use axum::{
    RequestPartsExt, async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::AppState;
use crate::data::User;
use crate::error::AppError;
use crate::remote::RemoteChat;

/// Extractor for the current authenticated user
///
/// Resolves `Authorization: Bearer <token>` to the owning [`User`] and
/// the remote client bound to them. A token whose user has no bound
/// client (e.g. after a restart) is rejected like an unknown token.
///
/// # Usage
/// ```ignore
/// async fn handler(current: CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", current.user.username)
/// }
/// ```
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub client: Arc<dyn RemoteChat>,
    /// Bearer token the request was authenticated with
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let state = AppState::from_ref(state);
        let user = state.sessions.resolve(bearer.token())?;
        let client = state.sessions.client_for(&user.id).ok_or_else(|| {
            tracing::debug!(user_id = %user.id, "Token resolved but no remote session is bound");
            AppError::Unauthorized
        })?;

        Ok(CurrentUser {
            user,
            client,
            token: bearer.token().to_string(),
        })
    }
}
