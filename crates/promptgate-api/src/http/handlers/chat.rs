//! SSE streaming chat endpoint.
//!
//! POST /api/v1/chat/stream
//!
//! Runs the full pipeline (authorize quota, fit context, call provider)
//! and relays the completion as Server-Sent Events. Usage accounting
//! rides inside the relayed stream: a record is committed when the
//! provider finishes, and never for aborted or errored streams.
//!
//! SSE event types:
//! - `connected` — provider connection established: `{}`
//! - `text_delta` — incremental text: `{ "text": "..." }`
//! - `done` — stream complete: `{}`
//! - `error` — error occurred mid-stream: `{ "message": "..." }`

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use promptgate_core::service::ChatStreamParams;
use promptgate_types::llm::{Message, StreamEvent};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// Request body for the streaming chat endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamChatRequest {
    /// Model to complete with. Must be a known chat model.
    pub model: String,
    /// Optional system prompt; the gateway default applies if absent.
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    /// Full conversation history, oldest first. The gateway trims it to
    /// fit the model's context window.
    pub messages: Vec<Message>,
}

/// POST /api/v1/chat/stream — SSE streaming chat.
pub async fn stream_chat(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<StreamChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let params = ChatStreamParams {
        model: body.model,
        system_prompt: body.system_prompt,
        temperature: body.temperature,
        messages: body.messages,
    };

    // Pre-stream failures surface as plain HTTP errors; once streaming
    // starts, failures arrive as `error` SSE events instead.
    let stream = state.chat_service.stream_chat(&user_id, params).await?;

    let sse_stream = async_stream::stream! {
        let mut stream = std::pin::pin!(stream);

        while let Some(event_result) = stream.next().await {
            match event_result {
                Ok(StreamEvent::Connected) => {
                    yield Ok::<_, Infallible>(Event::default().event("connected").data("{}"));
                }
                Ok(StreamEvent::TextDelta { text }) => {
                    let data = serde_json::json!({ "text": text });
                    yield Ok(Event::default().event("text_delta").data(data.to_string()));
                }
                Ok(StreamEvent::Done) => {
                    yield Ok(Event::default().event("done").data("{}"));
                    break;
                }
                Err(e) => {
                    let data = serde_json::json!({ "message": e.to_string() });
                    yield Ok(Event::default().event("error").data(data.to_string()));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
