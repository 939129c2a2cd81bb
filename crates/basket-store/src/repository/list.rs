//! # List Repository
//!
//! Cache operations for shopping lists.
//!
//! Rows carry the entity columns plus the sync wrapper (`last_modified`,
//! `pending_sync`, `pending_op`). The `category_order` sequence is stored as
//! a JSON text column; a row that fails to parse degrades to `None` rather
//! than failing the read.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use basket_core::{LocalRecord, PendingOp, ShoppingList};

use crate::error::StoreResult;

/// Columns selected for every list read, in `ListRow` order.
const LIST_COLUMNS: &str = "id, owner_id, name, description, is_archived, category_order, \
     is_shared, share_code, created_by, created_at, updated_at, \
     last_modified, pending_sync, pending_op";

/// Raw row shape; converted to `LocalRecord<ShoppingList>` on read.
#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: String,
    owner_id: String,
    name: String,
    description: Option<String>,
    is_archived: bool,
    category_order: Option<String>,
    is_shared: bool,
    share_code: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_modified: i64,
    pending_sync: bool,
    pending_op: Option<PendingOp>,
}

impl From<ListRow> for LocalRecord<ShoppingList> {
    fn from(row: ListRow) -> Self {
        let category_order = row
            .category_order
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());

        LocalRecord {
            entity: ShoppingList {
                id: row.id,
                owner_id: row.owner_id,
                name: row.name,
                description: row.description,
                is_archived: row.is_archived,
                category_order,
                is_shared: row.is_shared,
                share_code: row.share_code,
                created_by: row.created_by,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            last_modified: row.last_modified,
            pending_sync: row.pending_sync,
            pending_op: row.pending_op,
        }
    }
}

/// Repository for list cache operations.
#[derive(Debug, Clone)]
pub struct ListRepository {
    pool: SqlitePool,
}

impl ListRepository {
    /// Creates a new ListRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ListRepository { pool }
    }

    /// Gets a list by id. Delete tombstones are invisible here.
    ///
    /// Storage errors degrade to `None`.
    pub async fn get(&self, id: &str) -> Option<LocalRecord<ShoppingList>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM lists \
             WHERE id = ?1 AND (pending_op IS NULL OR pending_op != 'delete')"
        );

        match sqlx::query_as::<_, ListRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row.map(LocalRecord::from),
            Err(e) => {
                warn!(error = %e, id = %id, "List read failed, treating as absent");
                None
            }
        }
    }

    /// Gets a list by id *including* delete tombstones.
    ///
    /// Used by the sync engine's pull merge, which must see pending records
    /// of every kind to reconcile them.
    pub async fn get_any(&self, id: &str) -> Option<LocalRecord<ShoppingList>> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?1");

        match sqlx::query_as::<_, ListRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row.map(LocalRecord::from),
            Err(e) => {
                warn!(error = %e, id = %id, "List read failed, treating as absent");
                None
            }
        }
    }

    /// Lists all lists for an owner. Delete tombstones are invisible here.
    ///
    /// Ordering is unspecified; callers re-sort for display. Storage errors
    /// degrade to an empty result.
    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<LocalRecord<ShoppingList>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM lists \
             WHERE owner_id = ?1 AND (pending_op IS NULL OR pending_op != 'delete')"
        );

        match sqlx::query_as::<_, ListRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.into_iter().map(LocalRecord::from).collect(),
            Err(e) => {
                warn!(error = %e, owner_id = %owner_id, "List scan failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Upserts a record keyed by id. Overwrites wholesale.
    pub async fn put(&self, record: &LocalRecord<ShoppingList>) -> StoreResult<()> {
        let category_order = record
            .entity
            .category_order
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT OR REPLACE INTO lists (
                id, owner_id, name, description, is_archived, category_order,
                is_shared, share_code, created_by, created_at, updated_at,
                last_modified, pending_sync, pending_op
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&record.entity.id)
        .bind(&record.entity.owner_id)
        .bind(&record.entity.name)
        .bind(&record.entity.description)
        .bind(record.entity.is_archived)
        .bind(category_order)
        .bind(record.entity.is_shared)
        .bind(&record.entity.share_code)
        .bind(&record.entity.created_by)
        .bind(record.entity.created_at)
        .bind(record.entity.updated_at)
        .bind(record.last_modified)
        .bind(record.pending_sync)
        .bind(record.pending_op)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Physically removes a row. Only used after a confirmed sync - user
    /// deletes go through tombstones instead.
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM lists WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All records awaiting push, oldest local write first.
    ///
    /// Includes tombstones - the push phase dispatches on `pending_op`.
    pub async fn pending(&self) -> Vec<LocalRecord<ShoppingList>> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM lists \
             WHERE pending_sync = 1 ORDER BY last_modified ASC"
        );

        match sqlx::query_as::<_, ListRow>(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows.into_iter().map(LocalRecord::from).collect(),
            Err(e) => {
                warn!(error = %e, "Pending list scan failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Counts records awaiting push.
    pub async fn count_pending(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE pending_sync = 1")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
