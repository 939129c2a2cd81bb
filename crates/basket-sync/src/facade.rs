//! # Offline-Aware Façade
//!
//! The single entry point the rest of the application calls. Every operation
//! routes dual-path:
//!
//! - **Reads**: remote-first when online; the result is mirrored into the
//!   cache as synced (best-effort, non-blocking) and returned. Offline, or
//!   when the remote call fails, the cache answers instead - the caller
//!   never sees the remote error.
//! - **Writes**: remote-first when online; on success the result is mirrored
//!   into the cache as synced. Offline, or on remote failure, the write
//!   lands in the cache tagged pending and the engine gets a fire-and-forget
//!   nudge. Either way the caller's write "succeeds" immediately -
//!   optimistic UI, sync deferred.
//!
//! Bulk import is the one exception: it is local-first regardless of
//! connectivity, favoring import throughput over immediate remote
//! confirmation.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use basket_core::{
    validation, ItemPatch, ListPatch, LocalRecord, NewItem, NewList, PendingOp, ShoppingItem,
    ShoppingList, Syncable, DEFAULT_CATEGORY,
};
use basket_store::Store;

use crate::auth::AuthProvider;
use crate::connectivity::ConnectivityMonitor;
use crate::engine::SyncHandle;
use crate::error::{SyncError, SyncResult};
use crate::import::parse_import;
use crate::remote::RemoteStore;

/// Dual-path read/write entry point for lists and items.
///
/// Explicitly constructed by the composition root; cheap to clone around
/// the application.
#[derive(Clone)]
pub struct ListService {
    store: Store,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    connectivity: ConnectivityMonitor,
    sync: SyncHandle,
}

impl ListService {
    /// Creates the façade over its collaborators.
    pub fn new(
        store: Store,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        connectivity: ConnectivityMonitor,
        sync: SyncHandle,
    ) -> Self {
        ListService {
            store,
            remote,
            auth,
            connectivity,
            sync,
        }
    }

    fn user(&self) -> SyncResult<String> {
        self.auth.current_user().ok_or(SyncError::NotAuthenticated)
    }

    fn online(&self) -> bool {
        self.connectivity.is_online()
    }

    // =========================================================================
    // List Reads
    // =========================================================================

    /// All lists for the signed-in user, sorted by creation time.
    pub async fn get_lists(&self) -> SyncResult<Vec<ShoppingList>> {
        let user_id = self.user()?;

        if self.online() {
            match self.remote.fetch_lists(&user_id, 0).await {
                Ok(mut lists) => {
                    self.mirror_lists(lists.clone());
                    lists.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                    return Ok(lists);
                }
                Err(e) => debug!(error = %e, "Remote list read failed, falling back to cache"),
            }
        }

        let mut lists: Vec<ShoppingList> = self
            .store
            .lists()
            .list_by_owner(&user_id)
            .await
            .into_iter()
            .map(|r| r.entity)
            .collect();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lists)
    }

    /// One list by id; `None` when it exists nowhere reachable.
    pub async fn get_list(&self, id: &str) -> SyncResult<Option<ShoppingList>> {
        self.user()?;

        if self.online() {
            match self.remote.get_list(id).await {
                Ok(Some(list)) => {
                    self.mirror_lists(vec![list.clone()]);
                    return Ok(Some(list));
                }
                Ok(None) => return Ok(None),
                Err(e) => debug!(error = %e, "Remote list read failed, falling back to cache"),
            }
        }

        Ok(self.store.lists().get(id).await.map(|r| r.entity))
    }

    /// All items on a list, sorted by position then creation time.
    pub async fn get_items(&self, list_id: &str) -> SyncResult<Vec<ShoppingItem>> {
        self.user()?;

        let mut items = if self.online() {
            match self.remote.list_items(list_id).await {
                Ok(items) => {
                    self.mirror_items(items.clone());
                    items
                }
                Err(e) => {
                    debug!(error = %e, "Remote item read failed, falling back to cache");
                    self.local_items(list_id).await
                }
            }
        } else {
            self.local_items(list_id).await
        };

        items.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(items)
    }

    async fn local_items(&self, list_id: &str) -> Vec<ShoppingItem> {
        self.store
            .items()
            .list_by_list(list_id)
            .await
            .into_iter()
            .map(|r| r.entity)
            .collect()
    }

    // =========================================================================
    // List Writes
    // =========================================================================

    /// Creates a list. Generates an id when the caller didn't provide one.
    pub async fn create_list(&self, new: NewList) -> SyncResult<ShoppingList> {
        validation::validate_name(&new.name)?;
        let user_id = self.user()?;

        let now = Utc::now();
        let entity = ShoppingList {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: user_id.clone(),
            name: new.name,
            description: new.description,
            is_archived: false,
            category_order: None,
            is_shared: false,
            share_code: None,
            created_by: Some(user_id),
            created_at: now,
            updated_at: now,
        };

        if self.online() {
            match self.remote.insert_list(&entity).await {
                Ok(created) => {
                    self.mirror_lists(vec![created.clone()]);
                    return Ok(created);
                }
                Err(e) => warn!(error = %e, "Remote list create failed, queueing locally"),
            }
        }

        self.store
            .lists()
            .put(&LocalRecord::pending(entity.clone(), PendingOp::Create))
            .await?;
        self.sync.request_sync();
        Ok(entity)
    }

    /// Merges the patch onto a list and re-stamps `updated_at`.
    ///
    /// Offline, fails with `NotFound` when the list isn't cached.
    pub async fn update_list(&self, id: &str, patch: ListPatch) -> SyncResult<ShoppingList> {
        if let Some(ref name) = patch.name {
            validation::validate_name(name)?;
        }
        self.user()?;

        if self.online() {
            match self.remote.update_list(id, &patch).await {
                Ok(updated) => {
                    self.mirror_lists(vec![updated.clone()]);
                    return Ok(updated);
                }
                Err(e) => warn!(error = %e, "Remote list update failed, queueing locally"),
            }
        }

        let Some(mut record) = self.store.lists().get(id).await else {
            return Err(SyncError::NotFound {
                entity: "list",
                id: id.to_string(),
            });
        };

        record.entity.apply(&patch);
        record.entity.touch(Utc::now());

        // A record the remote has never seen stays a create.
        let op = match record.pending_op {
            Some(PendingOp::Create) => PendingOp::Create,
            _ => PendingOp::Update,
        };

        let entity = record.entity.clone();
        self.store
            .lists()
            .put(&LocalRecord::pending(record.entity, op))
            .await?;
        self.sync.request_sync();
        Ok(entity)
    }

    /// Replaces the stored category display order (drag-reorder UI).
    pub async fn update_category_order(
        &self,
        list_id: &str,
        order: Vec<String>,
    ) -> SyncResult<ShoppingList> {
        self.update_list(list_id, ListPatch::category_order(order))
            .await
    }

    /// Deletes a list. Deleting something that doesn't exist locally is a
    /// silent no-op, not an error.
    pub async fn delete_list(&self, id: &str) -> SyncResult<()> {
        self.user()?;

        if self.online() {
            match self.remote.delete_list(id).await {
                Ok(()) => {
                    // Remote cascade removed the items; local child rows are
                    // acceptable orphans collected by a later pull.
                    if let Err(e) = self.store.lists().remove(id).await {
                        warn!(error = %e, id = %id, "Cache cleanup after remote delete failed");
                    }
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "Remote list delete failed, queueing locally"),
            }
        }

        let Some(record) = self.store.lists().get_any(id).await else {
            return Ok(());
        };

        self.store
            .lists()
            .put(&LocalRecord::pending(record.entity, PendingOp::Delete))
            .await?;
        self.sync.request_sync();
        Ok(())
    }

    // =========================================================================
    // Item Writes
    // =========================================================================

    /// Creates an item with creation defaults: amount 1, unit pcs, category
    /// "Other", unchecked, position 0.
    pub async fn create_item(&self, new: NewItem) -> SyncResult<ShoppingItem> {
        self.user()?;
        let entity = Self::build_item(new)?;

        if self.online() {
            match self.remote.insert_item(&entity).await {
                Ok(created) => {
                    self.mirror_items(vec![created.clone()]);
                    return Ok(created);
                }
                Err(e) => warn!(error = %e, "Remote item create failed, queueing locally"),
            }
        }

        self.store
            .items()
            .put(&LocalRecord::pending(entity.clone(), PendingOp::Create))
            .await?;
        self.sync.request_sync();
        Ok(entity)
    }

    /// Bulk import: local-store-first regardless of connectivity. Every
    /// payload becomes an individually-syncable pending create; one sync
    /// nudge follows the batch.
    pub async fn create_items(&self, new_items: Vec<NewItem>) -> SyncResult<Vec<ShoppingItem>> {
        self.user()?;
        validation::validate_import_size(new_items.len())?;

        let mut created = Vec::with_capacity(new_items.len());
        for new in new_items {
            let entity = Self::build_item(new)?;
            self.store
                .items()
                .put(&LocalRecord::pending(entity.clone(), PendingOp::Create))
                .await?;
            created.push(entity);
        }

        self.sync.request_sync();
        Ok(created)
    }

    /// Merges the patch onto an item and re-stamps `updated_at`.
    ///
    /// Offline, fails with `NotFound` when the item isn't cached.
    pub async fn update_item(&self, id: &str, patch: ItemPatch) -> SyncResult<ShoppingItem> {
        if let Some(ref name) = patch.name {
            validation::validate_name(name)?;
        }
        if let Some(amount) = patch.amount {
            validation::validate_amount(amount)?;
        }
        self.user()?;

        if self.online() {
            match self.remote.update_item(id, &patch).await {
                Ok(updated) => {
                    self.mirror_items(vec![updated.clone()]);
                    return Ok(updated);
                }
                Err(e) => warn!(error = %e, "Remote item update failed, queueing locally"),
            }
        }

        let Some(mut record) = self.store.items().get(id).await else {
            return Err(SyncError::NotFound {
                entity: "item",
                id: id.to_string(),
            });
        };

        record.entity.apply(&patch);
        record.entity.touch(Utc::now());

        let op = match record.pending_op {
            Some(PendingOp::Create) => PendingOp::Create,
            _ => PendingOp::Update,
        };

        let entity = record.entity.clone();
        self.store
            .items()
            .put(&LocalRecord::pending(record.entity, op))
            .await?;
        self.sync.request_sync();
        Ok(entity)
    }

    /// Sets the checked flag - the highest-traffic write in the app, and
    /// the reason item conflicts resolve by freshest timestamp.
    pub async fn toggle_checked(&self, id: &str, is_checked: bool) -> SyncResult<ShoppingItem> {
        self.update_item(id, ItemPatch::checked(is_checked)).await
    }

    /// Deletes an item. Silent no-op when it doesn't exist locally.
    pub async fn delete_item(&self, id: &str) -> SyncResult<()> {
        self.user()?;

        if self.online() {
            match self.remote.delete_item(id).await {
                Ok(()) => {
                    if let Err(e) = self.store.items().remove(id).await {
                        warn!(error = %e, id = %id, "Cache cleanup after remote delete failed");
                    }
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "Remote item delete failed, queueing locally"),
            }
        }

        let Some(record) = self.store.items().get_any(id).await else {
            return Ok(());
        };

        self.store
            .items()
            .put(&LocalRecord::pending(record.entity, PendingOp::Delete))
            .await?;
        self.sync.request_sync();
        Ok(())
    }

    // =========================================================================
    // Bulk Import
    // =========================================================================

    /// Imports lists (with their items) from a JSON payload in any of the
    /// accepted shapes. Lists route dual-path like any create; items go
    /// through the local-first bulk path.
    pub async fn import(&self, json: &str) -> SyncResult<Vec<ShoppingList>> {
        let payload = parse_import(json)?;

        let mut imported = Vec::with_capacity(payload.len());
        for import_list in payload {
            let list = self
                .create_list(NewList {
                    id: None,
                    name: import_list.name,
                    description: import_list.description,
                })
                .await?;

            let items: Vec<NewItem> = import_list
                .items
                .into_iter()
                .map(|mut item| {
                    item.list_id = list.id.clone();
                    item
                })
                .collect();

            if !items.is_empty() {
                self.create_items(items).await?;
            }

            imported.push(list);
        }

        Ok(imported)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Applies creation defaults and validates a new item.
    fn build_item(new: NewItem) -> SyncResult<ShoppingItem> {
        validation::validate_name(&new.name)?;
        let amount = new.amount.unwrap_or(1.0);
        validation::validate_amount(amount)?;

        let now = Utc::now();
        Ok(ShoppingItem {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            list_id: new.list_id,
            name: new.name,
            amount,
            unit: new.unit.unwrap_or_default(),
            category: new
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            notes: new.notes,
            image_url: new.image_url,
            is_checked: new.is_checked.unwrap_or(false),
            position: new.position.unwrap_or(0),
            created_at: now,
            updated_at: now,
        })
    }

    /// Best-effort, non-blocking mirror of remote reads into the cache.
    fn mirror_lists(&self, lists: Vec<ShoppingList>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            for list in lists {
                if let Err(e) = store.lists().put(&LocalRecord::synced(list)).await {
                    debug!(error = %e, "List mirror write failed");
                }
            }
        });
    }

    /// Best-effort, non-blocking mirror of remote reads into the cache.
    fn mirror_items(&self, items: Vec<ShoppingItem>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            for item in items {
                if let Err(e) = store.items().put(&LocalRecord::synced(item)).await {
                    debug!(error = %e, "Item mirror write failed");
                }
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
