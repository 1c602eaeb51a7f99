//! Model listing endpoint.
//!
//! GET /api/v1/models — the chat models this gateway serves, with their
//! context and output limits so clients can size requests.

use axum::extract::State;
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub context_length: u32,
    pub max_output_tokens: u32,
}

/// GET /api/v1/models — list available chat models.
pub async fn list_models(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<ApiResponse<Vec<ModelSummary>>, AppError> {
    let models = state
        .catalog
        .chat_models()
        .into_iter()
        .map(|m| ModelSummary {
            id: m.id.clone(),
            name: m.name.clone(),
            context_length: m.context_length,
            max_output_tokens: m.max_output_tokens,
        })
        .collect();

    Ok(ApiResponse::success(models))
}
