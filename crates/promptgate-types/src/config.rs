//! Gateway configuration types.
//!
//! `GatewayConfig` represents the top-level `config.toml` that controls
//! quota policy, the reserved output budget, provider connection settings,
//! and pricing overrides. All fields have sensible defaults.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Promptgate gateway.
///
/// Loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Tokens reserved for the model's output when fitting the context
    /// window. The effective max output is `min(reserved, remaining)`.
    #[serde(default = "default_reserved_output_tokens")]
    pub reserved_output_tokens: u32,

    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-million-token pricing overrides for cost estimation.
    #[serde(default)]
    pub pricing: Vec<ModelPricing>,
}

fn default_reserved_output_tokens() -> u32 {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            quota: QuotaConfig::default(),
            reserved_output_tokens: default_reserved_output_tokens(),
            provider: ProviderConfig::default(),
            pricing: Vec::new(),
        }
    }
}

/// Quota policy: billing window and token limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// The time range over which usage is summed for rate-limiting.
    #[serde(default)]
    pub window: QuotaWindow,

    /// Default total-token limit per user per window.
    #[serde(default = "default_token_limit")]
    pub token_limit: u64,

    /// Per-model overrides of the default limit.
    #[serde(default)]
    pub model_limits: Vec<ModelTokenLimit>,
}

fn default_token_limit() -> u64 {
    1_000_000
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            window: QuotaWindow::default(),
            token_limit: default_token_limit(),
            model_limits: Vec::new(),
        }
    }
}

impl QuotaConfig {
    /// Resolve the token limit for a model: per-model override first,
    /// then the default.
    pub fn limit_for(&self, model_id: &str) -> u64 {
        self.model_limits
            .iter()
            .find(|l| l.model_id == model_id)
            .map(|l| l.token_limit)
            .unwrap_or(self.token_limit)
    }
}

/// Billing window shape. Configurable, not hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaWindow {
    /// The current calendar month (UTC), from the first of the month.
    CalendarMonth,
    /// A rolling window of the last N hours.
    RollingHours(u32),
}

impl Default for QuotaWindow {
    fn default() -> Self {
        QuotaWindow::CalendarMonth
    }
}

/// Token limit override for a single model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTokenLimit {
    pub model_id: String,
    pub token_limit: u64,
}

/// Connection settings for the OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Override the default provider base URL.
    pub base_url: Option<String>,
    /// Environment variable holding the provider API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

/// Cost information for a model pattern, USD per million tokens.
///
/// `model_pattern` is matched by prefix against model identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model_pattern: String,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}
