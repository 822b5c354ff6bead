//! User directory endpoint

use axum::{extract::State, response::Json};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::AppError;

/// GET /api/users
///
/// Syncs the remote user list, then returns every locally known user
/// except the caller.
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .reconciler
        .sync_users(&current.user, current.client.as_ref())
        .await?;
    Ok(Json(users))
}
