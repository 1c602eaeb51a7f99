//! API key storage and verification.
//!
//! Keys are generated once, shown to the caller in plaintext, and stored
//! only as SHA-256 hashes. Authentication hashes the presented key and
//! looks the hash up in the `api_keys` table.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use promptgate_types::error::StorageError;

use super::pool::DatabasePool;

/// Result of a successful key lookup.
#[derive(Debug, Clone)]
pub struct VerifiedKey {
    pub key_id: String,
    pub user_id: String,
}

/// SQLite-backed API key store.
pub struct SqliteApiKeyStore {
    pool: DatabasePool,
}

impl SqliteApiKeyStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Generate a key for `user_id`, store its hash, and return the
    /// plaintext. The plaintext is not recoverable afterwards.
    pub async fn create(&self, user_id: &str, name: &str) -> Result<String, StorageError> {
        let mut key_bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key_bytes);
        let plaintext = format!(
            "pg_{}",
            key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
        );

        sqlx::query(
            "INSERT INTO api_keys (id, key_hash, user_id, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(hash_api_key(&plaintext))
        .bind(user_id)
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(plaintext)
    }

    /// Look up the user owning `key`. Returns `None` for unknown keys.
    pub async fn verify(&self, key: &str) -> Result<Option<VerifiedKey>, StorageError> {
        let row = sqlx::query("SELECT id, user_id FROM api_keys WHERE key_hash = ?")
            .bind(hash_api_key(key))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let key_id: String = row
                    .try_get("id")
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                let user_id: String = row
                    .try_get("user_id")
                    .map_err(|e| StorageError::Query(e.to_string()))?;
                Ok(Some(VerifiedKey { key_id, user_id }))
            }
            None => Ok(None),
        }
    }

    /// Stamp `last_used_at` for a key. Callers treat failures as
    /// non-fatal; losing the stamp must not fail the request.
    pub async fn touch_last_used(&self, key_id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(key_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }
}

/// SHA-256 of an API key, lowercase hex.
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path().join("test.db")).await.unwrap();
        std::mem::forget(dir);
        pool
    }

    #[tokio::test]
    async fn create_then_verify_resolves_user() {
        let store = SqliteApiKeyStore::new(test_pool().await);
        let key = store.create("u-1", "default").await.unwrap();
        assert!(key.starts_with("pg_"));

        let verified = store.verify(&key).await.unwrap().unwrap();
        assert_eq!(verified.user_id, "u-1");
    }

    #[tokio::test]
    async fn unknown_key_verifies_to_none() {
        let store = SqliteApiKeyStore::new(test_pool().await);
        store.create("u-1", "default").await.unwrap();

        let verified = store.verify("pg_deadbeef").await.unwrap();
        assert!(verified.is_none());
    }

    #[tokio::test]
    async fn keys_are_unique_per_call() {
        let store = SqliteApiKeyStore::new(test_pool().await);
        let a = store.create("u-1", "first").await.unwrap();
        let b = store.create("u-1", "second").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn touch_last_used_stamps_the_key() {
        let pool = test_pool().await;
        let store = SqliteApiKeyStore::new(pool.clone());
        let key = store.create("u-1", "default").await.unwrap();
        let verified = store.verify(&key).await.unwrap().unwrap();

        store.touch_last_used(&verified.key_id).await.unwrap();

        let (last_used,): (Option<String>,) =
            sqlx::query_as("SELECT last_used_at FROM api_keys WHERE id = ?")
                .bind(&verified.key_id)
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert!(last_used.is_some());
    }

    #[test]
    fn hash_is_stable_hex() {
        let h1 = hash_api_key("pg_abc");
        let h2 = hash_api_key("pg_abc");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
