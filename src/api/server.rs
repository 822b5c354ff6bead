//! Remote server record endpoint

use axum::{extract::State, response::Json};

use crate::AppState;
use crate::data::RemoteServer;
use crate::error::AppError;

/// GET /api/server
///
/// Public. Lets a client prefill its login form with the server the
/// relay last authenticated against.
pub async fn active_server(State(state): State<AppState>) -> Result<Json<RemoteServer>, AppError> {
    state
        .store
        .active_server()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No server configured".to_string()))
}
