//! Infrastructure implementations for Promptgate.
//!
//! Concrete backends for the ports defined in `promptgate-core`: SQLite
//! persistence for the usage ledger and API keys, the OpenAI-compatible
//! streaming provider, the tiktoken BPE tokenizer, and configuration
//! loading.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod tokenizer;
