//! LLM provider implementations and cost estimation.

pub mod openai_compat;
pub mod pricing;

pub use openai_compat::OpenAiProvider;
