//! Channel message endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};

use super::dto::{SendMessageRequest, ValidatedJson};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::MessageView;

/// GET /api/channels/:channel_id/messages
///
/// Oldest first.
pub async fn channel_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = state
        .reconciler
        .sync_channel_messages(current.client.as_ref(), &channel_id)
        .await?;
    Ok(Json(messages))
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> Result<Json<MessageView>, AppError> {
    let message = state
        .reconciler
        .send_message(
            &current.user,
            current.client.as_ref(),
            &request.channel_id,
            &request.content,
        )
        .await?;
    Ok(Json(message))
}
