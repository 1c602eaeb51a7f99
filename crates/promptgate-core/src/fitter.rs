//! Context window fitter.
//!
//! Selects the maximal suffix of a conversation history that, together
//! with the system prompt and a reserved output budget, fits under the
//! model's context length. Pure: a function of its inputs, no owned
//! state, no side effects.

use promptgate_types::llm::Message;
use promptgate_types::model::ModelDescriptor;

use crate::tokenizer::{serialize_transcript, Tokenizer};

/// Output of the fitter: the trimmed message set plus the token math
/// the relay needs later.
///
/// Invariant: `prompt_tokens + max_output_tokens <= context_length`.
#[derive(Debug, Clone)]
pub struct TrimmedRequest {
    /// Chronologically ordered (oldest first) suffix of the input history.
    pub messages: Vec<Message>,
    /// Token count of the serialized system prompt + trimmed messages.
    pub prompt_tokens: u32,
    /// `min(reserved_output_tokens, context_length - prompt_tokens)`,
    /// never negative.
    pub max_output_tokens: u32,
}

impl TrimmedRequest {
    /// An empty trim signals "conversation too long for this model".
    /// The caller must fail the request rather than send it.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Fit a message history into the model's context window.
///
/// Walks the history from most recent to oldest. Each candidate message
/// is tentatively prepended to the kept set and the serialized transcript
/// is re-counted; the walk stops (discarding the candidate) the moment
/// the count exceeds `context_length - reserved_output_tokens`. Recency
/// wins: older messages are the ones dropped.
///
/// Never errors. If even the most recent message together with the
/// system prompt exceeds the budget, the result is empty -- a deliberate
/// sentinel, not a silent truncation.
pub fn fit<T: Tokenizer + ?Sized>(
    tokenizer: &T,
    descriptor: &ModelDescriptor,
    system_prompt: &str,
    reserved_output_tokens: u32,
    history: &[Message],
) -> TrimmedRequest {
    let budget = descriptor
        .context_length
        .saturating_sub(reserved_output_tokens);

    // kept is newest-first while scanning; reversed at the end.
    let mut kept: Vec<Message> = Vec::new();
    for message in history.iter().rev() {
        let mut tentative: Vec<Message> = Vec::with_capacity(kept.len() + 1);
        tentative.push(message.clone());
        tentative.extend(kept.iter().rev().cloned());

        let serialized = serialize_transcript(system_prompt, &tentative);
        let count = tokenizer.count(descriptor.encoding, &serialized) as u32;
        if count > budget {
            break;
        }
        kept.push(message.clone());
    }
    kept.reverse();

    let prompt_tokens =
        tokenizer.count(descriptor.encoding, &serialize_transcript(system_prompt, &kept)) as u32;
    let max_output_tokens =
        reserved_output_tokens.min(descriptor.context_length.saturating_sub(prompt_tokens));

    TrimmedRequest {
        messages: kept,
        prompt_tokens,
        max_output_tokens,
    }
}
