//! Login, logout and current user endpoints

use axum::{Router, extract::State, response::Json, routing::get, routing::post};

use super::dto::{LoginRequest, LoginResponse, MessageResponse, ValidatedJson};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::AppError;

/// POST /api/auth/login
///
/// Authenticates against the remote server named in the body and binds
/// a session. The returned token is the remote session token.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = state
        .auth
        .login(&request.username, &request.password, &request.server_url)
        .await?;

    Ok(Json(LoginResponse { user, token }))
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .logout(&current.user, &current.token, &current.client)?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /api/auth/me
async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
