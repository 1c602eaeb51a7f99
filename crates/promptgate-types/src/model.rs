//! Model descriptors: static reference data for the model catalog.
//!
//! A [`ModelDescriptor`] captures everything the pipeline needs to know
//! about a model before calling it: context length, output ceiling, the
//! BPE encoding used for token counting, and whether it is a chat or an
//! embedding model. Descriptors are constructed once at startup and never
//! mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// BPE encoding family used to count tokens for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEncoding {
    Cl100kBase,
    O200kBase,
}

impl fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenEncoding::Cl100kBase => write!(f, "cl100k_base"),
            TokenEncoding::O200kBase => write!(f, "o200k_base"),
        }
    }
}

impl FromStr for TokenEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" => Ok(TokenEncoding::Cl100kBase),
            "o200k_base" => Ok(TokenEncoding::O200kBase),
            other => Err(format!("invalid token encoding: '{other}'")),
        }
    }
}

/// Category of a model: chat completion or embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Chat,
    Embedding,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Chat => write!(f, "chat"),
            ModelKind::Embedding => write!(f, "embedding"),
        }
    }
}

/// Static description of one model known to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Provider-facing model identifier (e.g., "gpt-4o").
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Maximum combined token count across prompt and output.
    pub context_length: u32,
    /// Maximum tokens the model will generate in one response.
    pub max_output_tokens: u32,
    pub kind: ModelKind,
    pub encoding: TokenEncoding,
}
