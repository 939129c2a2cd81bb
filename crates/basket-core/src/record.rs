//! # Local Record Wrapper
//!
//! The local cache stores entities wrapped with sync bookkeeping: when the
//! record was last written locally, whether it still needs to reach the
//! remote service, and which operation is outstanding.
//!
//! ## Tombstones
//! A delete performed offline does not remove the record. It is tagged
//! `pending_op = Delete` and kept physically present so the sync engine can
//! replay the deletion against the remote service. Read paths filter these
//! tombstones out; only a confirmed sync removes the row for real.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ShoppingItem, ShoppingList};

/// Current wall-clock time in milliseconds since epoch.
///
/// All sync bookkeeping (wrapper `last_modified`, the pull watermark) uses
/// this representation so comparisons are plain integer comparisons.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// Pending Operation
// =============================================================================

/// The mutation a pending record still owes the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PendingOp {
    /// Entity was created locally and never inserted remotely.
    Create,
    /// Entity exists remotely but local changes have not been pushed.
    Update,
    /// Entity was deleted locally; the row is a tombstone until the remote
    /// delete is confirmed.
    Delete,
}

impl std::fmt::Display for PendingOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingOp::Create => write!(f, "create"),
            PendingOp::Update => write!(f, "update"),
            PendingOp::Delete => write!(f, "delete"),
        }
    }
}

// =============================================================================
// Syncable Entities
// =============================================================================

/// Common surface the sync engine needs from both entity kinds.
pub trait Syncable {
    /// Opaque unique id.
    fn id(&self) -> &str;

    /// Conflict tie-breaker: `updated_at` as milliseconds since epoch.
    fn updated_at_ms(&self) -> i64;

    /// Re-stamps `updated_at`. Called on every local mutation.
    fn touch(&mut self, at: DateTime<Utc>);
}

impl Syncable for ShoppingList {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at_ms(&self) -> i64 {
        self.updated_at.timestamp_millis()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl Syncable for ShoppingItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at_ms(&self) -> i64 {
        self.updated_at.timestamp_millis()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

// =============================================================================
// Local Record
// =============================================================================

/// An entity as stored in the local cache: payload plus sync bookkeeping.
///
/// `last_modified` is the client-side wall clock of the *local* write. It is
/// distinct from the entity's own `updated_at`: the entity timestamp takes
/// part in conflict resolution, the wrapper timestamp is diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecord<T> {
    /// The wrapped entity payload.
    pub entity: T,

    /// Client wall-clock milliseconds of the local write.
    pub last_modified: i64,

    /// True while the record has not been confirmed against the remote.
    pub pending_sync: bool,

    /// Outstanding operation; present only while `pending_sync` is true.
    pub pending_op: Option<PendingOp>,
}

impl<T> LocalRecord<T> {
    /// Wraps an entity that is already confirmed against the remote.
    pub fn synced(entity: T) -> Self {
        LocalRecord {
            entity,
            last_modified: now_ms(),
            pending_sync: false,
            pending_op: None,
        }
    }

    /// Wraps an entity carrying an unconfirmed local mutation.
    pub fn pending(entity: T, op: PendingOp) -> Self {
        LocalRecord {
            entity,
            last_modified: now_ms(),
            pending_sync: true,
            pending_op: Some(op),
        }
    }

    /// True when this record is a delete tombstone.
    ///
    /// Tombstones are excluded from every normal read path while remaining
    /// physically present until sync confirms the remote deletion.
    pub fn is_tombstone(&self) -> bool {
        self.pending_op == Some(PendingOp::Delete)
    }

    /// Clears the pending markers after a confirmed push.
    pub fn mark_synced(&mut self) {
        self.pending_sync = false;
        self.pending_op = None;
        self.last_modified = now_ms();
    }
}

// =============================================================================
// Sync Metadata
// =============================================================================

/// Per-user sync checkpoint: the watermark used to ask the remote service
/// for "anything changed since".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub user_id: String,

    /// Milliseconds since epoch of the last successful pull; 0 means never
    /// synced (pull everything).
    pub last_sync_at: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;

    fn item(id: &str) -> ShoppingItem {
        ShoppingItem {
            id: id.into(),
            list_id: "l1".into(),
            name: "Milk".into(),
            amount: 1.0,
            unit: Unit::Pieces,
            category: "Dairy".into(),
            notes: None,
            image_url: None,
            is_checked: false,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_synced_record_has_no_pending_markers() {
        let record = LocalRecord::synced(item("i1"));
        assert!(!record.pending_sync);
        assert!(record.pending_op.is_none());
        assert!(!record.is_tombstone());
    }

    #[test]
    fn test_pending_delete_is_tombstone() {
        let record = LocalRecord::pending(item("i1"), PendingOp::Delete);
        assert!(record.pending_sync);
        assert!(record.is_tombstone());

        let record = LocalRecord::pending(item("i1"), PendingOp::Update);
        assert!(!record.is_tombstone());
    }

    #[test]
    fn test_mark_synced_clears_pending() {
        let mut record = LocalRecord::pending(item("i1"), PendingOp::Create);
        record.mark_synced();
        assert!(!record.pending_sync);
        assert!(record.pending_op.is_none());
    }

    #[test]
    fn test_pending_op_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PendingOp::Delete).unwrap(),
            "\"delete\""
        );
        assert_eq!(PendingOp::Create.to_string(), "create");
    }

    #[test]
    fn test_touch_updates_tiebreaker() {
        let mut entity = item("i1");
        let before = entity.updated_at_ms();
        let later = Utc::now() + chrono::Duration::milliseconds(5_000);
        entity.touch(later);
        assert!(entity.updated_at_ms() > before);
    }
}
