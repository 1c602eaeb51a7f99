//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use promptgate_types::error::{ChatError, StorageError};
use promptgate_types::llm::LlmError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Pipeline errors from the chat service.
    Chat(ChatError),
    /// Authentication failure at the gateway's own API key layer.
    Unauthorized(String),
    /// Request validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Chat(ChatError::Storage(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Chat(ChatError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Chat(ChatError::RateLimited { reason }) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", reason.clone())
            }
            AppError::Chat(ChatError::MessageTooLong) => (
                StatusCode::BAD_REQUEST,
                "MESSAGE_TOO_LONG",
                "Message does not fit the model's context window".to_string(),
            ),
            AppError::Chat(ChatError::UnknownModel(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_MODEL", msg.clone())
            }
            AppError::Chat(ChatError::Provider(e)) => {
                // Pass through the upstream status when the provider
                // reported one; otherwise the failure is ours to name.
                let status = match e {
                    LlmError::Provider {
                        status: Some(code), ..
                    } => StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY),
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "PROVIDER_ERROR", e.to_string())
            }
            AppError::Chat(ChatError::Storage(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
