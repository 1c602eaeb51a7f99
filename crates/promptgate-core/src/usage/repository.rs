//! UsageRepository trait definition.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition), following
//! the same pattern as the other ports in this crate.

use chrono::{DateTime, Utc};

use promptgate_types::error::StorageError;
use promptgate_types::usage::{ModelUsage, UsageRecord, UsageTotals};

/// Repository trait for usage record persistence and aggregation.
///
/// Implementations live in promptgate-infra (e.g., `SqliteUsageRepository`).
/// Every operation is a single atomic store operation; no implementation
/// may require a multi-step transaction, and aggregation must tolerate
/// records arriving in arbitrary timestamp order.
pub trait UsageRepository: Send + Sync {
    /// Durably append one record. Records are independent; no
    /// cross-record transaction is needed.
    fn insert(
        &self,
        record: &UsageRecord,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Sum token counts for one user/model pair over a time window.
    ///
    /// Both bounds are exclusive: `recorded_at > from AND recorded_at < to`.
    fn sum_between(
        &self,
        user_id: &str,
        model_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<UsageTotals, StorageError>> + Send;

    /// Per-model totals for one user over a time window, for usage
    /// reporting. Same exclusive bounds as `sum_between`.
    fn sum_by_model(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<ModelUsage>, StorageError>> + Send;
}
