//! CompletionProvider trait definition.

use std::pin::Pin;

use futures_util::Stream;

use promptgate_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// A boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for streaming completion backends.
///
/// The `stream` method returns a boxed stream so the relay can wrap it
/// without naming the concrete stream type. The provider may fail with
/// [`LlmError`] before the first chunk or mid-stream; each chunk delivery
/// is a suspension point.
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Issue a streaming completion request.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
