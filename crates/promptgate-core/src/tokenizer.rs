//! Tokenizer port and transcript serialization.
//!
//! Token counting runs over a serialized representation of the full
//! message sequence, role framing included, because framing contributes
//! to the real token cost of a request. The concrete BPE implementation
//! lives in `promptgate-infra`.

use promptgate_types::llm::Message;
use promptgate_types::model::TokenEncoding;

/// Counts tokens for a given encoding. Deterministic for a fixed
/// encoding + text pair.
///
/// Implementations live in promptgate-infra (e.g., `TiktokenTokenizer`).
/// Counting is synchronous; encoding tables are loaded lazily once per
/// process by the implementation.
pub trait Tokenizer: Send + Sync {
    fn count(&self, encoding: TokenEncoding, text: &str) -> usize;
}

/// Serialize a system prompt plus message history into the framed text
/// the tokenizer counts.
///
/// Each message is framed as `<|role|> content <|end|>`, one per line,
/// system prompt first. The framing markers are whitespace-delimited so
/// they cost tokens like the provider's own chat framing does.
pub fn serialize_transcript(system_prompt: &str, messages: &[Message]) -> String {
    let mut out = format!("<|system|> {system_prompt} <|end|>");
    for message in messages {
        out.push_str(&format!("\n<|{}|> {} <|end|>", message.role, message.content));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptgate_types::llm::MessageRole;

    #[test]
    fn test_serialize_transcript_frames_roles() {
        let messages = vec![
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let serialized = serialize_transcript("be brief", &messages);
        assert_eq!(
            serialized,
            "<|system|> be brief <|end|>\n<|user|> hi <|end|>\n<|assistant|> hello <|end|>"
        );
    }

    #[test]
    fn test_serialize_transcript_empty_history() {
        let serialized = serialize_transcript("sys", &[]);
        assert_eq!(serialized, "<|system|> sys <|end|>");
    }

    #[test]
    fn test_serialize_transcript_is_deterministic() {
        let messages = vec![Message {
            role: MessageRole::User,
            content: "same input".to_string(),
        }];
        let a = serialize_transcript("p", &messages);
        let b = serialize_transcript("p", &messages);
        assert_eq!(a, b);
    }
}
