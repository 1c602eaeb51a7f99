//! SQLite-backed usage ledger storage.
//!
//! Append-only `usage_records` table. Window sums are pushed down to SQL
//! with both bounds exclusive (`recorded_at > from AND recorded_at < to`).
//! Timestamps are stored as fixed-width RFC 3339 text with microsecond
//! precision so lexicographic comparison matches chronological order and
//! the `(user_id, model_id, recorded_at)` index serves range scans.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use promptgate_core::usage::repository::UsageRepository;
use promptgate_types::error::StorageError;
use promptgate_types::usage::{ModelUsage, UsageRecord, UsageTotals};

use super::pool::DatabasePool;

/// Usage record repository backed by the shared database pool.
pub struct SqliteUsageRepository {
    pool: DatabasePool,
}

impl SqliteUsageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UsageRepository for SqliteUsageRepository {
    async fn insert(&self, record: &UsageRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"INSERT INTO usage_records
               (id, user_id, model_id, operation, prompt_tokens, completion_tokens, total_tokens, recorded_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(&record.user_id)
        .bind(&record.model_id)
        .bind(record.operation.to_string())
        .bind(i64::from(record.counts.prompt_tokens))
        .bind(i64::from(record.counts.completion_tokens))
        .bind(i64::from(record.counts.total_tokens))
        .bind(format_timestamp(&record.recorded_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn sum_between(
        &self,
        user_id: &str,
        model_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<UsageTotals, StorageError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"SELECT COALESCE(SUM(prompt_tokens), 0),
                      COALESCE(SUM(completion_tokens), 0),
                      COALESCE(SUM(total_tokens), 0)
               FROM usage_records
               WHERE user_id = ? AND model_id = ?
                 AND recorded_at > ? AND recorded_at < ?"#,
        )
        .bind(user_id)
        .bind(model_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(UsageTotals {
            prompt_tokens: row.0 as u64,
            completion_tokens: row.1 as u64,
            total_tokens: row.2 as u64,
        })
    }

    async fn sum_by_model(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ModelUsage>, StorageError> {
        let rows = sqlx::query(
            r#"SELECT model_id,
                      COALESCE(SUM(prompt_tokens), 0) AS prompt_tokens,
                      COALESCE(SUM(completion_tokens), 0) AS completion_tokens,
                      COALESCE(SUM(total_tokens), 0) AS total_tokens
               FROM usage_records
               WHERE user_id = ? AND recorded_at > ? AND recorded_at < ?
               GROUP BY model_id
               ORDER BY model_id"#,
        )
        .bind(user_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        let mut usage = Vec::with_capacity(rows.len());
        for row in rows {
            let model_id: String = row
                .try_get("model_id")
                .map_err(|e| StorageError::Query(e.to_string()))?;
            let prompt: i64 = row
                .try_get("prompt_tokens")
                .map_err(|e| StorageError::Query(e.to_string()))?;
            let completion: i64 = row
                .try_get("completion_tokens")
                .map_err(|e| StorageError::Query(e.to_string()))?;
            let total: i64 = row
                .try_get("total_tokens")
                .map_err(|e| StorageError::Query(e.to_string()))?;

            usage.push(ModelUsage {
                model_id,
                totals: UsageTotals {
                    prompt_tokens: prompt as u64,
                    completion_tokens: completion as u64,
                    total_tokens: total as u64,
                },
            });
        }
        Ok(usage)
    }
}

/// Fixed-width RFC 3339 with microsecond precision and a `Z` suffix.
/// All stored timestamps share this shape, so string comparison in SQL
/// is chronological comparison.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
