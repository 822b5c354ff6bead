//! Request and response bodies
//!
//! JSON field names are camelCase, matching the browser client.

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::data::User;
use crate::error::AppError;

/// Body-level validation run after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// JSON body extractor that reports every rejection as a 400
///
/// Wraps [`axum::Json`] so malformed bodies and failed [`Validate`]
/// checks share the `{"message": ...}` error shape.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub server_url: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("serverUrl", &self.server_url)?;

        let url = url::Url::parse(&self.server_url)
            .map_err(|_| AppError::Validation("serverUrl must be a valid URL".to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AppError::Validation(
                "serverUrl must be an http(s) URL".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Conversations and messages
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub other_user_id: String,
}

impl Validate for CreateConversationRequest {
    fn validate(&self) -> Result<(), AppError> {
        require("otherUserId", &self.other_user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
}

impl Validate for SendMessageRequest {
    fn validate(&self) -> Result<(), AppError> {
        require("channelId", &self.channel_id)?;
        require("content", &self.content)
    }
}
