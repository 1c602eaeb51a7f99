//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and compared against the `api_keys` table.
//! Extraction resolves the key to its owning user id, which scopes all
//! quota checks and usage records downstream.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request. Extracting this validates the API key and
/// carries the resolved user id.
pub struct Authenticated(pub String);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;

        let verified = state
            .api_keys
            .verify(&api_key)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match verified {
            Some(key) => {
                // Best effort; losing the stamp must not fail the request.
                let _ = state.api_keys.touch_last_used(&key.key_id).await;
                Ok(Authenticated(key.user_id))
            }
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}
