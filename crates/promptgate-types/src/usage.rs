//! Usage ledger types: records, aggregated totals, and quota decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of billable operation a usage record accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Chat,
    Embedding,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Chat => write!(f, "chat"),
            OperationKind::Embedding => write!(f, "embedding"),
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(OperationKind::Chat),
            "embedding" => Ok(OperationKind::Embedding),
            other => Err(format!("invalid operation kind: '{other}'")),
        }
    }
}

/// Token counts for one completed operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl UsageCounts {
    /// Build counts from prompt and completion, deriving the total.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Durable log entry of tokens consumed by one completed operation.
///
/// Append-only: never updated or deleted after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: String,
    pub model_id: String,
    pub operation: OperationKind,
    pub counts: UsageCounts,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregated token totals over a set of usage records.
///
/// Wider than [`UsageCounts`] because a billing window sums many records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Per-model usage within a billing window, for usage reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    pub model_id: String,
    pub totals: UsageTotals,
}

/// Outcome of a quota check, computed fresh per request.
///
/// Never cached: concurrent requests from the same user must each
/// re-check against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied {
        /// Human-readable reason, surfaced in the 429 response body.
        reason: String,
    },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }
}
