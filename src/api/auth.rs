use super::AppState;
use crate::constants::API_KEY_HEADER;
use crate::domain::User;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Rejects requests without the configured server API key.
/// Without a configured key every request passes.
pub async fn require_api_key<B>(
    State(state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    if let Some(expected) = state.config.auth.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            debug!(path = %request.uri().path(), "Rejected request with missing or wrong api key");
            return ApiError::Forbidden("a valid api key is required".into()).into_response();
        }
    }
    next.run(request).await
}

/// The user identified by the request's `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let user = state
            .storage
            .get_user_by_token(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        Ok(CurrentUser(user))
    }
}

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.0.username
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.0.is_staff {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "{} is not course staff",
                self.0.username
            )))
        }
    }
}
