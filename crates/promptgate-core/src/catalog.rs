//! Immutable model catalog.
//!
//! Built once at startup from the builtin table (optionally extended from
//! config) and looked up by exact model id -- never by scanning and
//! string-comparing against an enum-like list.

use std::collections::HashMap;

use promptgate_types::error::ChatError;
use promptgate_types::model::{ModelDescriptor, ModelKind, TokenEncoding};

/// Immutable mapping from model identifier to descriptor.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: HashMap<String, ModelDescriptor>,
}

impl ModelCatalog {
    /// Build a catalog from an explicit descriptor list.
    pub fn new(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        Self {
            models: descriptors
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    /// The builtin descriptor table for models the gateway knows about.
    ///
    /// Context and output limits are the provider's published values.
    pub fn builtin() -> Self {
        Self::new([
            ModelDescriptor {
                id: "gpt-4o".to_string(),
                name: "GPT-4o".to_string(),
                context_length: 128_000,
                max_output_tokens: 16_384,
                kind: ModelKind::Chat,
                encoding: TokenEncoding::O200kBase,
            },
            ModelDescriptor {
                id: "gpt-4o-mini".to_string(),
                name: "GPT-4o mini".to_string(),
                context_length: 128_000,
                max_output_tokens: 16_384,
                kind: ModelKind::Chat,
                encoding: TokenEncoding::O200kBase,
            },
            ModelDescriptor {
                id: "gpt-4-turbo".to_string(),
                name: "GPT-4 Turbo".to_string(),
                context_length: 128_000,
                max_output_tokens: 4_096,
                kind: ModelKind::Chat,
                encoding: TokenEncoding::Cl100kBase,
            },
            ModelDescriptor {
                id: "gpt-4".to_string(),
                name: "GPT-4".to_string(),
                context_length: 8_192,
                max_output_tokens: 8_192,
                kind: ModelKind::Chat,
                encoding: TokenEncoding::Cl100kBase,
            },
            ModelDescriptor {
                id: "gpt-3.5-turbo".to_string(),
                name: "GPT-3.5 Turbo".to_string(),
                context_length: 16_385,
                max_output_tokens: 4_096,
                kind: ModelKind::Chat,
                encoding: TokenEncoding::Cl100kBase,
            },
            ModelDescriptor {
                id: "text-embedding-3-small".to_string(),
                name: "Text Embedding 3 Small".to_string(),
                context_length: 8_191,
                max_output_tokens: 0,
                kind: ModelKind::Embedding,
                encoding: TokenEncoding::Cl100kBase,
            },
        ])
    }

    /// Look up a descriptor by exact model id.
    pub fn get(&self, model_id: &str) -> Result<&ModelDescriptor, ChatError> {
        self.models
            .get(model_id)
            .ok_or_else(|| ChatError::UnknownModel(model_id.to_string()))
    }

    /// Chat-capable models, sorted by id for stable listing.
    pub fn chat_models(&self) -> Vec<&ModelDescriptor> {
        let mut models: Vec<&ModelDescriptor> = self
            .models
            .values()
            .filter(|d| d.kind == ModelKind::Chat)
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_by_exact_id() {
        let catalog = ModelCatalog::builtin();
        let desc = catalog.get("gpt-4o").unwrap();
        assert_eq!(desc.context_length, 128_000);
        assert_eq!(desc.encoding, TokenEncoding::O200kBase);
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        let catalog = ModelCatalog::builtin();
        let err = catalog.get("gpt-9000").unwrap_err();
        assert!(matches!(err, ChatError::UnknownModel(id) if id == "gpt-9000"));
    }

    #[test]
    fn test_prefix_does_not_match() {
        // Exact-key lookup: "gpt-4" must not resolve "gpt-4-0613".
        let catalog = ModelCatalog::builtin();
        assert!(catalog.get("gpt-4-0613").is_err());
    }

    #[test]
    fn test_chat_models_excludes_embeddings() {
        let catalog = ModelCatalog::builtin();
        let chat = catalog.chat_models();
        assert!(chat.iter().all(|d| d.kind == ModelKind::Chat));
        assert!(!chat.iter().any(|d| d.id == "text-embedding-3-small"));
    }

    #[test]
    fn test_chat_models_sorted_by_id() {
        let catalog = ModelCatalog::builtin();
        let ids: Vec<&str> = catalog.chat_models().iter().map(|d| d.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
