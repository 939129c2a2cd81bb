//! # Sync Metadata Repository
//!
//! One row per user: the pull watermark. The sync engine reads it at the
//! start of every cycle and advances it after a clean pull.

use sqlx::SqlitePool;
use tracing::warn;

use basket_core::SyncMetadata;

use crate::error::StoreResult;

/// Repository for the per-user sync checkpoint.
#[derive(Debug, Clone)]
pub struct SyncMetaRepository {
    pool: SqlitePool,
}

impl SyncMetaRepository {
    /// Creates a new SyncMetaRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncMetaRepository { pool }
    }

    /// Returns the checkpoint record for a user, if one exists.
    ///
    /// Storage errors degrade to `None`.
    pub async fn get(&self, user_id: &str) -> Option<SyncMetadata> {
        let result: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT last_sync_at FROM sync_metadata WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await;

        match result {
            Ok(value) => value.map(|last_sync_at| SyncMetadata {
                user_id: user_id.to_string(),
                last_sync_at,
            }),
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Sync metadata read failed");
                None
            }
        }
    }

    /// Returns the watermark for a user in milliseconds since epoch.
    ///
    /// 0 when the user has never synced (pull everything) or on a read
    /// failure - over-fetching is safe, pull merges are idempotent.
    pub async fn watermark(&self, user_id: &str) -> i64 {
        self.get(user_id).await.map(|m| m.last_sync_at).unwrap_or(0)
    }

    /// Advances the watermark for a user.
    pub async fn set_watermark(&self, user_id: &str, at_ms: i64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sync_metadata (user_id, last_sync_at) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET last_sync_at = excluded.last_sync_at",
        )
        .bind(user_id)
        .bind(at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};

    #[tokio::test]
    async fn test_watermark_defaults_to_epoch() {
        let repo = Store::open(StoreConfig::in_memory())
            .await
            .unwrap()
            .sync_meta();

        assert_eq!(repo.watermark("u1").await, 0);
    }

    #[tokio::test]
    async fn test_set_and_advance_watermark() {
        let repo = Store::open(StoreConfig::in_memory())
            .await
            .unwrap()
            .sync_meta();

        repo.set_watermark("u1", 1_000).await.unwrap();
        assert_eq!(repo.watermark("u1").await, 1_000);

        repo.set_watermark("u1", 2_000).await.unwrap();
        assert_eq!(repo.watermark("u1").await, 2_000);

        let meta = repo.get("u1").await.unwrap();
        assert_eq!(meta.user_id, "u1");
        assert_eq!(meta.last_sync_at, 2_000);

        // Per-user isolation
        assert_eq!(repo.watermark("u2").await, 0);
        assert!(repo.get("u2").await.is_none());
    }
}
