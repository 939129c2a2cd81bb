//! # Item Repository
//!
//! Cache operations for shopping items. Same contract as the list
//! repository; the secondary lookup here is by parent list.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use basket_core::{LocalRecord, PendingOp, ShoppingItem, Unit};

use crate::error::StoreResult;

/// Columns selected for every item read, in `ItemRow` order.
const ITEM_COLUMNS: &str = "id, list_id, name, amount, unit, category, notes, image_url, \
     is_checked, position, created_at, updated_at, \
     last_modified, pending_sync, pending_op";

/// Raw row shape; converted to `LocalRecord<ShoppingItem>` on read.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    list_id: String,
    name: String,
    amount: f64,
    unit: Unit,
    category: String,
    notes: Option<String>,
    image_url: Option<String>,
    is_checked: bool,
    position: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_modified: i64,
    pending_sync: bool,
    pending_op: Option<PendingOp>,
}

impl From<ItemRow> for LocalRecord<ShoppingItem> {
    fn from(row: ItemRow) -> Self {
        LocalRecord {
            entity: ShoppingItem {
                id: row.id,
                list_id: row.list_id,
                name: row.name,
                amount: row.amount,
                unit: row.unit,
                category: row.category,
                notes: row.notes,
                image_url: row.image_url,
                is_checked: row.is_checked,
                position: row.position,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            last_modified: row.last_modified,
            pending_sync: row.pending_sync,
            pending_op: row.pending_op,
        }
    }
}

/// Repository for item cache operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by id. Delete tombstones are invisible here.
    ///
    /// Storage errors degrade to `None`.
    pub async fn get(&self, id: &str) -> Option<LocalRecord<ShoppingItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE id = ?1 AND (pending_op IS NULL OR pending_op != 'delete')"
        );

        match sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row.map(LocalRecord::from),
            Err(e) => {
                warn!(error = %e, id = %id, "Item read failed, treating as absent");
                None
            }
        }
    }

    /// Gets an item by id *including* delete tombstones (sync engine only).
    pub async fn get_any(&self, id: &str) -> Option<LocalRecord<ShoppingItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        match sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row.map(LocalRecord::from),
            Err(e) => {
                warn!(error = %e, id = %id, "Item read failed, treating as absent");
                None
            }
        }
    }

    /// Lists all items on a list. Delete tombstones are invisible here.
    ///
    /// Ordering is unspecified; the façade re-sorts by position then
    /// creation time. Storage errors degrade to an empty result.
    pub async fn list_by_list(&self, list_id: &str) -> Vec<LocalRecord<ShoppingItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE list_id = ?1 AND (pending_op IS NULL OR pending_op != 'delete')"
        );

        match sqlx::query_as::<_, ItemRow>(&sql)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows.into_iter().map(LocalRecord::from).collect(),
            Err(e) => {
                warn!(error = %e, list_id = %list_id, "Item scan failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Upserts a record keyed by id. Overwrites wholesale.
    pub async fn put(&self, record: &LocalRecord<ShoppingItem>) -> StoreResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO items (
                id, list_id, name, amount, unit, category, notes, image_url,
                is_checked, position, created_at, updated_at,
                last_modified, pending_sync, pending_op
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&record.entity.id)
        .bind(&record.entity.list_id)
        .bind(&record.entity.name)
        .bind(record.entity.amount)
        .bind(record.entity.unit)
        .bind(&record.entity.category)
        .bind(&record.entity.notes)
        .bind(&record.entity.image_url)
        .bind(record.entity.is_checked)
        .bind(record.entity.position)
        .bind(record.entity.created_at)
        .bind(record.entity.updated_at)
        .bind(record.last_modified)
        .bind(record.pending_sync)
        .bind(record.pending_op)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Physically removes a row. Only used after a confirmed sync.
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All records awaiting push, oldest local write first.
    pub async fn pending(&self) -> Vec<LocalRecord<ShoppingItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE pending_sync = 1 ORDER BY last_modified ASC"
        );

        match sqlx::query_as::<_, ItemRow>(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows.into_iter().map(LocalRecord::from).collect(),
            Err(e) => {
                warn!(error = %e, "Pending item scan failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Counts records awaiting push.
    pub async fn count_pending(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE pending_sync = 1")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
