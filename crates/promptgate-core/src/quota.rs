//! Quota authorization: advisory check before any paid provider call.
//!
//! The check is advisory-then-commit: it runs before the call, but usage
//! is only recorded after a call completes, so two concurrent requests
//! from the same user can both pass and both complete, temporarily
//! exceeding quota. This race is accepted and documented; exact
//! enforcement would need a reserve/commit protocol.

use std::sync::Arc;

use tracing::{error, warn};

use promptgate_types::config::QuotaConfig;
use promptgate_types::usage::QuotaDecision;

use crate::usage::ledger::UsageLedger;
use crate::usage::repository::UsageRepository;

/// Decides allow/deny per request from a fresh ledger sum.
///
/// Decisions are never cached: concurrent requests from the same user
/// must each re-check.
pub struct QuotaAuthorizer<R: UsageRepository> {
    ledger: Arc<UsageLedger<R>>,
    config: QuotaConfig,
}

impl<R: UsageRepository> QuotaAuthorizer<R> {
    pub fn new(ledger: Arc<UsageLedger<R>>, config: QuotaConfig) -> Self {
        Self { ledger, config }
    }

    /// Check whether `user_id` may call `model_id` right now.
    ///
    /// Compares the window's total against the model's limit; at-limit
    /// counts as exceeded. A ledger read failure denies the request
    /// (fail-closed): the gateway never makes a paid call it cannot
    /// account against.
    pub async fn authorize(&self, user_id: &str, model_id: &str) -> QuotaDecision {
        let totals = match self
            .ledger
            .sum_window(user_id, model_id, &self.config.window)
            .await
        {
            Ok(totals) => totals,
            Err(e) => {
                error!(user_id, model_id, "quota check failed, denying: {e}");
                return QuotaDecision::Denied {
                    reason: "usage ledger unavailable; request denied".to_string(),
                };
            }
        };

        let limit = self.config.limit_for(model_id);
        if totals.total_tokens >= limit {
            warn!(
                user_id,
                model_id,
                used = totals.total_tokens,
                limit,
                "quota exceeded"
            );
            return QuotaDecision::Denied {
                reason: format!(
                    "token limit reached for {model_id}: {} of {} used this window",
                    totals.total_tokens, limit
                ),
            };
        }

        QuotaDecision::Allowed
    }
}
