//! Chat pipeline service: the single operation this crate exposes upward.
//!
//! Wires the stages in their required order: quota authorization strictly
//! precedes the provider call; context fitting and prompt counting happen
//! between them; usage recording strictly follows stream completion (it
//! lives inside the relay wrapper).

use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;
use tracing::info;

use promptgate_types::config::QuotaConfig;
use promptgate_types::error::ChatError;
use promptgate_types::llm::{CompletionRequest, LlmError, Message, StreamEvent};
use promptgate_types::model::ModelKind;
use promptgate_types::usage::QuotaDecision;

use crate::catalog::ModelCatalog;
use crate::fitter::fit;
use crate::llm::provider::CompletionProvider;
use crate::quota::QuotaAuthorizer;
use crate::relay::{tap_usage, RelayContext};
use crate::tokenizer::Tokenizer;
use crate::usage::ledger::UsageLedger;
use crate::usage::repository::UsageRepository;

/// System prompt used when the client does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Follow the user's instructions carefully. \
     Respond using markdown.";

/// Parameters of one chat request, after identity resolution.
#[derive(Debug, Clone)]
pub struct ChatStreamParams {
    pub model: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    /// Full conversation history, oldest first. The service trims it.
    pub messages: Vec<Message>,
}

/// Orchestrates the chat pipeline: authorize, fit, call, tap, record.
///
/// Generic over the usage repository, provider, and tokenizer so core
/// logic never depends on promptgate-infra.
pub struct ChatService<R, P, T>
where
    R: UsageRepository + 'static,
    P: CompletionProvider,
    T: Tokenizer + 'static,
{
    catalog: Arc<ModelCatalog>,
    ledger: Arc<UsageLedger<R>>,
    authorizer: QuotaAuthorizer<R>,
    provider: Arc<P>,
    tokenizer: Arc<T>,
    reserved_output_tokens: u32,
}

impl<R, P, T> ChatService<R, P, T>
where
    R: UsageRepository + 'static,
    P: CompletionProvider,
    T: Tokenizer + 'static,
{
    pub fn new(
        catalog: Arc<ModelCatalog>,
        ledger: Arc<UsageLedger<R>>,
        quota_config: QuotaConfig,
        provider: Arc<P>,
        tokenizer: Arc<T>,
        reserved_output_tokens: u32,
    ) -> Self {
        let authorizer = QuotaAuthorizer::new(ledger.clone(), quota_config);
        Self {
            catalog,
            ledger,
            authorizer,
            provider,
            tokenizer,
            reserved_output_tokens,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<UsageLedger<R>> {
        &self.ledger
    }

    /// Run the full pipeline for one request.
    ///
    /// On success, returns the live event stream with usage tapping
    /// already attached. All failures before streaming starts abort
    /// with a [`ChatError`] and no partial output.
    pub async fn stream_chat(
        &self,
        user_id: &str,
        params: ChatStreamParams,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>, ChatError> {
        let descriptor = self.catalog.get(&params.model)?.clone();
        if descriptor.kind != ModelKind::Chat {
            return Err(ChatError::UnknownModel(format!(
                "'{}' is not a chat model",
                descriptor.id
            )));
        }

        // Authorization strictly precedes the paid call.
        match self.authorizer.authorize(user_id, &descriptor.id).await {
            QuotaDecision::Allowed => {}
            QuotaDecision::Denied { reason } => {
                return Err(ChatError::RateLimited { reason });
            }
        }

        let system_prompt = params
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let trimmed = fit(
            self.tokenizer.as_ref(),
            &descriptor,
            &system_prompt,
            self.reserved_output_tokens.min(descriptor.max_output_tokens),
            &params.messages,
        );
        if trimmed.is_empty() {
            return Err(ChatError::MessageTooLong);
        }

        info!(
            user_id,
            model_id = %descriptor.id,
            prompt_tokens = trimmed.prompt_tokens,
            kept_messages = trimmed.messages.len(),
            max_output_tokens = trimmed.max_output_tokens,
            "dispatching completion"
        );

        let request = CompletionRequest {
            model: descriptor.id.clone(),
            messages: trimmed.messages,
            system: Some(system_prompt),
            max_tokens: trimmed.max_output_tokens,
            temperature: params.temperature,
        };

        let upstream = self.provider.stream(request);
        let relayed = tap_usage(
            upstream,
            RelayContext {
                ledger: self.ledger.clone(),
                tokenizer: self.tokenizer.clone(),
                encoding: descriptor.encoding,
                user_id: user_id.to_string(),
                model_id: descriptor.id.clone(),
                prompt_tokens: trimmed.prompt_tokens,
            },
        );

        Ok(relayed)
    }
}
