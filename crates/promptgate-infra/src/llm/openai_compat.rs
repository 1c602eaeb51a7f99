//! OpenAI-compatible completion provider.
//!
//! Works against any endpoint that speaks the OpenAI chat completions
//! protocol via a configurable base URL. Uses [`async_openai`] for
//! type-safe request building and built-in SSE streaming.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use promptgate_core::llm::provider::{CompletionProvider, EventStream};
use promptgate_types::config::ProviderConfig;
use promptgate_types::llm::{CompletionRequest, LlmError, MessageRole, StreamEvent};

/// Completion provider for OpenAI-compatible endpoints.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Build a provider from connection settings, reading the API key
    /// from the environment variable the config names.
    pub fn from_env(config: &ProviderConfig) -> anyhow::Result<Self> {
        let api_key: SecretString = std::env::var(&config.api_key_env)
            .map_err(|_| {
                anyhow::anyhow!("provider API key env var '{}' is not set", config.api_key_env)
            })?
            .into();

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key.expose_secret());
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            };
            messages.push(oai_msg);
        }

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            stream: Some(true),
            ..Default::default()
        }
    }
}

impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let oai_request = self.build_request(&request);
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let mut oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            yield StreamEvent::Connected;

            while let Some(result) = oai_stream.next().await {
                let chunk = result.map_err(map_openai_error)?;
                for choice in &chunk.choices {
                    if let Some(text) = &choice.delta.content {
                        if !text.is_empty() {
                            yield StreamEvent::TextDelta { text: text.clone() };
                        }
                    }
                }
            }

            yield StreamEvent::Done;
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else {
                LlmError::Provider {
                    status: None,
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status() {
            Some(status) if status.as_u16() == 401 => LlmError::AuthenticationFailed,
            Some(status) => LlmError::Provider {
                status: Some(status.as_u16()),
                message: err.to_string(),
            },
            None => LlmError::Provider {
                status: None,
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => LlmError::Stream(stream_err.to_string()),
        _ => LlmError::Provider {
            status: None,
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptgate_types::llm::Message;

    fn provider() -> OpenAiProvider {
        let config = OpenAIConfig::new().with_api_key("sk-test");
        OpenAiProvider {
            client: Client::with_config(config),
        }
    }

    #[test]
    fn build_request_includes_system_and_history() {
        let provider = provider();
        let request = CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![Message::user("Hello"), Message::assistant("Hi there!")],
            system: Some("Be helpful".to_string()),
            max_tokens: 1024,
            temperature: Some(0.7),
        };

        let oai_req = provider.build_request(&request);
        assert_eq!(oai_req.model, "gpt-4o");
        // 1 system + 2 conversation = 3 messages
        assert_eq!(oai_req.messages.len(), 3);
        assert_eq!(oai_req.max_completion_tokens, Some(1024));
        assert_eq!(oai_req.stream, Some(true));
    }

    #[test]
    fn build_request_without_system() {
        let provider = provider();
        let request = CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("hi")],
            system: None,
            max_tokens: 256,
            temperature: None,
        };

        let oai_req = provider.build_request(&request);
        assert_eq!(oai_req.messages.len(), 1);
        assert!(oai_req.temperature.is_none());
    }

    #[test]
    fn map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("authentication_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn map_openai_error_api_other_has_no_status() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "model overloaded".to_string(),
            r#type: Some("server_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        match err {
            LlmError::Provider { status, message } => {
                assert!(status.is_none());
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::Provider { status: None, .. }));
    }
}
