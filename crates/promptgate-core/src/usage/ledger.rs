//! Usage ledger service: record construction and window aggregation.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use promptgate_types::config::QuotaWindow;
use promptgate_types::error::StorageError;
use promptgate_types::usage::{ModelUsage, OperationKind, UsageCounts, UsageRecord, UsageTotals};

use crate::usage::repository::UsageRepository;

/// Owns usage record persistence. Generic over [`UsageRepository`] so
/// core logic never depends on the storage backend.
pub struct UsageLedger<R: UsageRepository> {
    repo: R,
}

impl<R: UsageRepository> UsageLedger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Append one usage record for a completed operation.
    ///
    /// The record is timestamped here, at commit time, not at request
    /// start. Returns the persisted record.
    pub async fn record(
        &self,
        user_id: &str,
        model_id: &str,
        operation: OperationKind,
        counts: UsageCounts,
    ) -> Result<UsageRecord, StorageError> {
        let record = UsageRecord {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            model_id: model_id.to_string(),
            operation,
            counts,
            recorded_at: Utc::now(),
        };

        self.repo.insert(&record).await?;
        info!(
            user_id = %record.user_id,
            model_id = %record.model_id,
            operation = %record.operation,
            total_tokens = record.counts.total_tokens,
            "usage recorded"
        );
        Ok(record)
    }

    /// Sum one user/model pair's usage over the current billing window.
    pub async fn sum_window(
        &self,
        user_id: &str,
        model_id: &str,
        window: &QuotaWindow,
    ) -> Result<UsageTotals, StorageError> {
        let (from, to) = window_bounds(window, Utc::now());
        self.repo.sum_between(user_id, model_id, from, to).await
    }

    /// Per-model usage for one user over the current billing window.
    pub async fn usage_by_model(
        &self,
        user_id: &str,
        window: &QuotaWindow,
    ) -> Result<Vec<ModelUsage>, StorageError> {
        let (from, to) = window_bounds(window, Utc::now());
        self.repo.sum_by_model(user_id, from, to).await
    }
}

/// Compute the `(from, to)` bounds of a billing window ending at `now`.
///
/// Both bounds are used exclusively by the repository queries
/// (`recorded_at > from AND recorded_at < to`); records carry commit
/// timestamps strictly before `now`, so the exclusive upper bound does
/// not drop them.
pub fn window_bounds(window: &QuotaWindow, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = match window {
        QuotaWindow::RollingHours(hours) => now - Duration::hours(i64::from(*hours)),
        QuotaWindow::CalendarMonth => now
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(now),
    };
    (from, now)
}
