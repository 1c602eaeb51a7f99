//! LLM provider abstraction.
//!
//! Defines the [`provider::CompletionProvider`] port the streaming relay
//! consumes. Concrete implementations live in `promptgate-infra`.

pub mod provider;
