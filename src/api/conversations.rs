//! Direct conversation endpoints

use axum::{extract::State, response::Json};

use super::dto::{CreateConversationRequest, ValidatedJson};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::ConversationView;

/// GET /api/direct-conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Json<Vec<ConversationView>> {
    Json(state.reconciler.list_conversations(&current.user))
}

/// POST /api/direct-conversations
///
/// Returns the existing conversation with `otherUserId` if there is one,
/// otherwise opens a direct channel remotely and records it.
pub async fn create_conversation(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateConversationRequest>,
) -> Result<Json<ConversationView>, AppError> {
    let view = state
        .reconciler
        .open_conversation(
            &current.user,
            current.client.as_ref(),
            &request.other_user_id,
        )
        .await?;
    Ok(Json(view))
}
