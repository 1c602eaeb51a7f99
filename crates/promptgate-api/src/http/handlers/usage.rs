//! Usage reporting endpoint.
//!
//! GET /api/v1/usage — per-model token totals for the authenticated user
//! over the current billing window, with approximate cost estimates.

use axum::extract::State;
use serde::Serialize;

use promptgate_infra::llm::pricing::{estimate_cost, format_cost};
use promptgate_types::config::QuotaWindow;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UsageReport {
    pub window: QuotaWindow,
    pub models: Vec<ModelUsageSummary>,
    pub total_tokens: u64,
    /// Approximate, always `~$`-prefixed.
    pub estimated_cost: String,
}

#[derive(Debug, Serialize)]
pub struct ModelUsageSummary {
    pub model_id: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: String,
}

/// GET /api/v1/usage — current-window usage for the calling user.
pub async fn get_usage(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<ApiResponse<UsageReport>, AppError> {
    let window = state.config.quota.window;
    let by_model = state.ledger.usage_by_model(&user_id, &window).await?;

    let mut total_tokens: u64 = 0;
    let mut total_cost: f64 = 0.0;
    let mut models = Vec::with_capacity(by_model.len());

    for usage in by_model {
        let cost = estimate_cost(
            usage.totals.prompt_tokens,
            usage.totals.completion_tokens,
            &usage.model_id,
            &state.config.pricing,
        );
        total_tokens += usage.totals.total_tokens;
        total_cost += cost;
        models.push(ModelUsageSummary {
            model_id: usage.model_id,
            prompt_tokens: usage.totals.prompt_tokens,
            completion_tokens: usage.totals.completion_tokens,
            total_tokens: usage.totals.total_tokens,
            estimated_cost: format_cost(cost),
        });
    }

    Ok(ApiResponse::success(UsageReport {
        window,
        models,
        total_tokens,
        estimated_cost: format_cost(total_cost),
    }))
}
