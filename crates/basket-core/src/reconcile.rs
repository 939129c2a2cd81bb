//! # Reconciliation Rules
//!
//! Pure decision procedures for choosing between conflicting local and
//! remote versions of the same record. No I/O: the sync engine fetches both
//! sides and asks this module who wins.
//!
//! ## Policy
//!
//! - **Lists**: local always wins. List metadata edits are infrequent and
//!   user-driven; the pending local edit is pushed and the remote value
//!   discarded.
//! - **Items**: the record with the later `updated_at` wins, compared as
//!   milliseconds since epoch. This protects frequent check/uncheck races
//!   across devices. On a tie, local wins: the device keeps its own view and
//!   the record feeds back into push, so the remote converges to the same
//!   value.
//!
//! The two policies are intentionally different and intentionally kept as
//! two separate functions. Resolution is always whole-record: one side
//! entirely replaces the other, never a field-level merge.

use crate::record::Syncable;
use crate::types::{ShoppingItem, ShoppingList};

/// Which side of a conflict survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The local pending record survives and is (re-)pushed to the remote.
    Local,
    /// The remote record overwrites the local copy; pending markers clear.
    Remote,
}

/// Resolves a conflict between a local pending list and its remote version.
///
/// Local always wins for lists.
pub fn resolve_list(_local: &ShoppingList, _remote: &ShoppingList) -> Winner {
    Winner::Local
}

/// Resolves a conflict between a local pending item and its remote version.
///
/// Later `updated_at` wins; a tie goes to local.
pub fn resolve_item(local: &ShoppingItem, remote: &ShoppingItem) -> Winner {
    if remote.updated_at_ms() > local.updated_at_ms() {
        Winner::Remote
    } else {
        Winner::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use chrono::{TimeZone, Utc};

    fn list_at(ms: i64, name: &str) -> ShoppingList {
        ShoppingList {
            id: "l1".into(),
            owner_id: "u1".into(),
            name: name.into(),
            description: None,
            is_archived: false,
            category_order: None,
            is_shared: false,
            share_code: None,
            created_by: None,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            updated_at: Utc.timestamp_millis_opt(ms).unwrap(),
        }
    }

    fn item_at(ms: i64, checked: bool) -> ShoppingItem {
        ShoppingItem {
            id: "i1".into(),
            list_id: "l1".into(),
            name: "Milk".into(),
            amount: 1.0,
            unit: Unit::Pieces,
            category: "Dairy".into(),
            notes: None,
            image_url: None,
            is_checked: checked,
            position: 0,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            updated_at: Utc.timestamp_millis_opt(ms).unwrap(),
        }
    }

    #[test]
    fn test_list_conflict_local_always_wins() {
        // Even a much fresher remote edit loses to a local pending list edit.
        let local = list_at(100, "Groceries");
        let remote = list_at(999_999, "Renamed Elsewhere");
        assert_eq!(resolve_list(&local, &remote), Winner::Local);
    }

    #[test]
    fn test_item_conflict_later_timestamp_wins() {
        // Device A checked at T=100 (offline); device B unchecked at T=200.
        // After A reconnects, the remote (200) must win: item ends unchecked.
        let local = item_at(100, true);
        let remote = item_at(200, false);
        assert_eq!(resolve_item(&local, &remote), Winner::Remote);

        let local = item_at(300, true);
        let remote = item_at(200, false);
        assert_eq!(resolve_item(&local, &remote), Winner::Local);
    }

    #[test]
    fn test_item_conflict_tie_goes_to_local() {
        let local = item_at(500, true);
        let remote = item_at(500, false);
        assert_eq!(resolve_item(&local, &remote), Winner::Local);
    }
}
