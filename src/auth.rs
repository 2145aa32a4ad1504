//! Principal extraction.
//!
//! Identity issuance lives in an upstream gateway that authenticates every
//! request and forwards the principal's stable id in `X-User-Id`. This
//! module only lifts that id into a typed extractor; store-ownership checks
//! happen in the services against `stores.owner_id`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated principal for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    Missing,
    #[error("Invalid principal id")]
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "Unauthorized",
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthError::Missing)?
            .to_str()
            .map_err(|_| AuthError::Invalid)?;

        let id = Uuid::parse_str(raw.trim()).map_err(|_| AuthError::Invalid)?;
        Ok(AuthenticatedUser { id })
    }
}
