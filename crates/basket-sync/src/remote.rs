//! # Remote Data Service Seam
//!
//! The remote relational store, specified at its interface boundary: CRUD
//! over two collections (`lists`, `items`) scoped to an owner, with
//! row-level `updated_at` timestamps and a "changed since" query per
//! collection for the pull phase.
//!
//! The concrete backend is an external collaborator; the application wires
//! in an HTTP client, tests and local development wire in [`MemoryRemote`].

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use basket_core::{ItemPatch, ListPatch, ShoppingItem, ShoppingList, Syncable};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Remote Store Trait
// =============================================================================

/// The remote data service consumed by the engine and the façade.
///
/// All calls are implicitly scoped to the authenticated user: lists by owner
/// id, items by their parent list's owner. Deletes cascade server-side
/// (deleting a list removes its items); the local cache does not replicate
/// the cascade.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists changed at or after `since_ms` for this owner.
    async fn fetch_lists(&self, owner_id: &str, since_ms: i64) -> SyncResult<Vec<ShoppingList>>;

    /// Items changed at or after `since_ms` across this owner's lists.
    async fn fetch_items(&self, owner_id: &str, since_ms: i64) -> SyncResult<Vec<ShoppingItem>>;

    /// Fetches one list by id.
    async fn get_list(&self, id: &str) -> SyncResult<Option<ShoppingList>>;

    /// Fetches all items on a list.
    async fn list_items(&self, list_id: &str) -> SyncResult<Vec<ShoppingItem>>;

    /// Inserts a list; returns the stored row.
    async fn insert_list(&self, list: &ShoppingList) -> SyncResult<ShoppingList>;

    /// Applies a patch to a list; returns the updated row.
    async fn update_list(&self, id: &str, patch: &ListPatch) -> SyncResult<ShoppingList>;

    /// Deletes a list (and, server-side, its items).
    async fn delete_list(&self, id: &str) -> SyncResult<()>;

    /// Inserts an item; returns the stored row.
    async fn insert_item(&self, item: &ShoppingItem) -> SyncResult<ShoppingItem>;

    /// Applies a patch to an item; returns the updated row.
    async fn update_item(&self, id: &str, patch: &ItemPatch) -> SyncResult<ShoppingItem>;

    /// Deletes an item.
    async fn delete_item(&self, id: &str) -> SyncResult<()>;
}

// =============================================================================
// In-Memory Reference Implementation
// =============================================================================

/// In-memory `RemoteStore` for tests and local development.
///
/// Knobs mimic an unreliable backend: [`set_available`](Self::set_available)
/// fails every call (service down while the network is up),
/// [`set_fail_deletes`](Self::set_fail_deletes) fails only deletes, and
/// [`set_latency`](Self::set_latency) delays every call.
pub struct MemoryRemote {
    lists: Mutex<HashMap<String, ShoppingList>>,
    items: Mutex<HashMap<String, ShoppingItem>>,
    available: AtomicBool,
    fail_deletes: AtomicBool,
    latency: Mutex<Duration>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        MemoryRemote::new()
    }
}

impl MemoryRemote {
    /// Creates an empty, reachable remote.
    pub fn new() -> Self {
        MemoryRemote {
            lists: Mutex::new(HashMap::new()),
            items: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            fail_deletes: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Simulates the service going down (or back up).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes delete calls fail while everything else succeeds.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Adds artificial latency to every call.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Number of stored lists (test assertions).
    pub fn list_count(&self) -> usize {
        lock(&self.lists).len()
    }

    /// Number of stored items (test assertions).
    pub fn item_count(&self) -> usize {
        lock(&self.items).len()
    }

    /// Direct snapshot of a stored item (test assertions).
    pub fn item_snapshot(&self, id: &str) -> Option<ShoppingItem> {
        lock(&self.items).get(id).cloned()
    }

    /// Direct snapshot of a stored list (test assertions).
    pub fn list_snapshot(&self, id: &str) -> Option<ShoppingList> {
        lock(&self.lists).get(id).cloned()
    }

    /// Seeds a list without going through the trait (test setup).
    pub fn seed_list(&self, list: ShoppingList) {
        lock(&self.lists).insert(list.id.clone(), list);
    }

    /// Seeds an item without going through the trait (test setup).
    pub fn seed_item(&self, item: ShoppingItem) {
        lock(&self.items).insert(item.id.clone(), item);
    }

    async fn checkpoint(&self) -> SyncResult<()> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("service unavailable".into()));
        }

        Ok(())
    }
}

/// Std mutex lock that shrugs off poisoning - state stays usable even if a
/// test thread panicked mid-call.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch_lists(&self, owner_id: &str, since_ms: i64) -> SyncResult<Vec<ShoppingList>> {
        self.checkpoint().await?;

        Ok(lock(&self.lists)
            .values()
            .filter(|l| l.owner_id == owner_id && l.updated_at_ms() >= since_ms)
            .cloned()
            .collect())
    }

    async fn fetch_items(&self, owner_id: &str, since_ms: i64) -> SyncResult<Vec<ShoppingItem>> {
        self.checkpoint().await?;

        let owned_lists: Vec<String> = lock(&self.lists)
            .values()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| l.id.clone())
            .collect();

        Ok(lock(&self.items)
            .values()
            .filter(|i| owned_lists.contains(&i.list_id) && i.updated_at_ms() >= since_ms)
            .cloned()
            .collect())
    }

    async fn get_list(&self, id: &str) -> SyncResult<Option<ShoppingList>> {
        self.checkpoint().await?;
        Ok(lock(&self.lists).get(id).cloned())
    }

    async fn list_items(&self, list_id: &str) -> SyncResult<Vec<ShoppingItem>> {
        self.checkpoint().await?;

        Ok(lock(&self.items)
            .values()
            .filter(|i| i.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn insert_list(&self, list: &ShoppingList) -> SyncResult<ShoppingList> {
        self.checkpoint().await?;

        // Upsert: re-pushing a create after a partially failed cycle must
        // not error.
        lock(&self.lists).insert(list.id.clone(), list.clone());
        Ok(list.clone())
    }

    async fn update_list(&self, id: &str, patch: &ListPatch) -> SyncResult<ShoppingList> {
        self.checkpoint().await?;

        let mut lists = lock(&self.lists);
        let list = lists
            .get_mut(id)
            .ok_or_else(|| SyncError::Remote(format!("list not found: {id}")))?;

        list.apply(patch);
        list.updated_at = Utc::now();
        Ok(list.clone())
    }

    async fn delete_list(&self, id: &str) -> SyncResult<()> {
        self.checkpoint().await?;

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("delete rejected".into()));
        }

        lock(&self.lists).remove(id);
        // Server-side cascade
        lock(&self.items).retain(|_, item| item.list_id != id);
        Ok(())
    }

    async fn insert_item(&self, item: &ShoppingItem) -> SyncResult<ShoppingItem> {
        self.checkpoint().await?;

        lock(&self.items).insert(item.id.clone(), item.clone());
        Ok(item.clone())
    }

    async fn update_item(&self, id: &str, patch: &ItemPatch) -> SyncResult<ShoppingItem> {
        self.checkpoint().await?;

        let mut items = lock(&self.items);
        let item = items
            .get_mut(id)
            .ok_or_else(|| SyncError::Remote(format!("item not found: {id}")))?;

        item.apply(patch);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_item(&self, id: &str) -> SyncResult<()> {
        self.checkpoint().await?;

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("delete rejected".into()));
        }

        lock(&self.items).remove(id);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use basket_core::Unit;

    fn list(id: &str, owner: &str, updated_ms: i64) -> ShoppingList {
        use chrono::TimeZone;
        ShoppingList {
            id: id.into(),
            owner_id: owner.into(),
            name: "Groceries".into(),
            description: None,
            is_archived: false,
            category_order: None,
            is_shared: false,
            share_code: None,
            created_by: None,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            updated_at: Utc.timestamp_millis_opt(updated_ms).unwrap(),
        }
    }

    fn item(id: &str, list_id: &str, updated_ms: i64) -> ShoppingItem {
        use chrono::TimeZone;
        ShoppingItem {
            id: id.into(),
            list_id: list_id.into(),
            name: "Milk".into(),
            amount: 1.0,
            unit: Unit::Pieces,
            category: "Other".into(),
            notes: None,
            image_url: None,
            is_checked: false,
            position: 0,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            updated_at: Utc.timestamp_millis_opt(updated_ms).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_fetch_scoped_by_owner_and_watermark() {
        let remote = MemoryRemote::new();
        remote.seed_list(list("l1", "u1", 100));
        remote.seed_list(list("l2", "u1", 300));
        remote.seed_list(list("l3", "u2", 500));

        let fetched = remote.fetch_lists("u1", 200).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, "l2");

        // Watermark boundary is inclusive
        let fetched = remote.fetch_lists("u1", 300).await.unwrap();
        assert_eq!(fetched.len(), 1);
    }

    #[tokio::test]
    async fn test_items_scoped_through_parent_list_owner() {
        let remote = MemoryRemote::new();
        remote.seed_list(list("l1", "u1", 0));
        remote.seed_list(list("l2", "u2", 0));
        remote.seed_item(item("i1", "l1", 100));
        remote.seed_item(item("i2", "l2", 100));

        let fetched = remote.fetch_items("u1", 0).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, "i1");
    }

    #[tokio::test]
    async fn test_delete_list_cascades_items() {
        let remote = MemoryRemote::new();
        remote.seed_list(list("l1", "u1", 0));
        remote.seed_item(item("i1", "l1", 0));
        remote.seed_item(item("i2", "l1", 0));

        remote.delete_list("l1").await.unwrap();
        assert_eq!(remote.list_count(), 0);
        assert_eq!(remote.item_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_remote_fails_every_call() {
        let remote = MemoryRemote::new();
        remote.set_available(false);

        assert!(remote.fetch_lists("u1", 0).await.is_err());
        assert!(remote.insert_list(&list("l1", "u1", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_patches_and_restamps() {
        let remote = MemoryRemote::new();
        remote.seed_item(item("i1", "l1", 100));

        let updated = remote
            .update_item("i1", &ItemPatch::checked(true))
            .await
            .unwrap();

        assert!(updated.is_checked);
        assert!(updated.updated_at_ms() > 100);
        assert!(remote
            .update_item("missing", &ItemPatch::checked(true))
            .await
            .is_err());
    }
}
