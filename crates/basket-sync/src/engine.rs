//! # Sync Engine
//!
//! Pull-then-push synchronization cycles between the local cache and the
//! remote service.
//!
//! ## Cycle Order
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        One Sync Cycle                            │
//! │                                                                  │
//! │  1. PULL (remote → local)                                        │
//! │     watermark = sync_metadata.last_sync_at (0 if never synced)   │
//! │     fetch lists/items changed since watermark, per entity:       │
//! │       no local record        → insert as synced                  │
//! │       local, not pending     → overwrite with remote             │
//! │       local, pending         → reconcile (core rules)            │
//! │     watermark = now (only after a clean pull)                    │
//! │                                                                  │
//! │  2. PUSH (local → remote)                                        │
//! │     pending lists first (items reference lists), then items:     │
//! │       create/update → remote upsert, clear pending on success    │
//! │       delete        → attempt remote delete, remove local row    │
//! │                       REGARDLESS of the remote outcome           │
//! │     failures: counted, error recorded, record stays pending      │
//! │                                                                  │
//! │  Pull runs first because push decisions depend on fresh remote   │
//! │  state for the conflict comparison.                              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Triggers
//! - interval timer (while online, default 30 s)
//! - connectivity flipping to online
//! - post-write nudges from the façade (bounded trigger channel)
//! - explicit [`SyncEngine::sync_now`]
//!
//! Every trigger re-checks authentication first; signed-out cycles are
//! skipped silently. A reentrancy guard collapses concurrent triggers into
//! at most one running cycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use basket_core::{
    now_ms, resolve_item, resolve_list, LocalRecord, PendingOp, ShoppingItem, ShoppingList, Winner,
};
use basket_store::Store;

use crate::auth::AuthProvider;
use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;

// =============================================================================
// Status & Results
// =============================================================================

/// Public sync status, pushed to every registered listener on change.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    /// Current connectivity flag.
    pub is_online: bool,

    /// Milliseconds since epoch of the last completed cycle.
    pub last_sync: Option<i64>,

    /// Records still awaiting push (lists + items).
    pub pending_changes: i64,

    /// True while a cycle is running.
    pub syncing: bool,

    /// Error strings from the most recent cycle.
    pub errors: Vec<String>,
}

/// Counters produced by one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Records applied or pushed cleanly.
    pub synced: usize,

    /// Records that failed and remain pending.
    pub failed: usize,

    /// Records that needed conflict resolution during pull.
    pub conflicts: usize,

    /// Error messages keyed by entity name.
    pub errors: Vec<String>,
}

impl SyncReport {
    fn record_error(&mut self, entity_name: &str, err: &SyncError) {
        self.failed += 1;
        self.errors.push(format!("{entity_name}: {err}"));
    }
}

/// Result of asking for a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A cycle ran to completion (possibly with per-record failures).
    Completed(SyncReport),

    /// Another cycle is in flight; nothing was started.
    AlreadyRunning,

    /// Network is unreachable; nothing was started.
    Offline,

    /// No authenticated user; skipped silently.
    NotAuthenticated,
}

/// Opaque handle for removing a status listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&SyncStatus) + Send + Sync>;

// =============================================================================
// Handle
// =============================================================================

/// Cheap handle the façade uses to nudge the engine after local writes.
///
/// The nudge is fire-and-forget over a bounded channel: it never blocks the
/// write, and a full queue just drops the nudge - the interval timer and the
/// reentrancy guard make the drop harmless.
#[derive(Clone)]
pub struct SyncHandle {
    trigger_tx: mpsc::Sender<()>,
}

impl SyncHandle {
    /// Requests a background cycle soon. Never blocks, never fails.
    pub fn request_sync(&self) {
        let _ = self.trigger_tx.try_send(());
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// The sync engine service. Explicitly constructed and owned by the
/// application's composition root; `start` spawns the background loop and
/// `shutdown` stops it.
pub struct SyncEngine {
    store: Store,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    connectivity: ConnectivityMonitor,
    config: SyncConfig,

    /// Current public status; mutated under lock, cloned out for listeners.
    status: Mutex<SyncStatus>,

    /// Registered status listeners, notified synchronously on every change.
    listeners: Mutex<HashMap<u64, Listener>>,
    next_listener: AtomicU64,

    /// Reentrancy guard: true while a cycle is executing.
    guard: AtomicBool,

    /// Post-write trigger channel (bounded).
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: Mutex<Option<mpsc::Receiver<()>>>,

    /// Shutdown channel for the background loop.
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

/// Std mutex lock that shrugs off poisoning; status must stay readable even
/// if a listener panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SyncEngine {
    /// Creates a new engine. Call [`start`](Self::start) to spawn the
    /// background loop; `sync_now` works without it.
    pub fn new(
        store: Store,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        connectivity: ConnectivityMonitor,
        config: SyncConfig,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(config.trigger_queue.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let status = SyncStatus {
            is_online: connectivity.is_online(),
            ..Default::default()
        };

        SyncEngine {
            store,
            remote,
            auth,
            connectivity,
            config,
            status: Mutex::new(status),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(0),
            guard: AtomicBool::new(false),
            trigger_tx,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            shutdown_tx,
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
        }
    }

    /// Returns a handle for post-write sync nudges.
    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            trigger_tx: self.trigger_tx.clone(),
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> SyncStatus {
        lock(&self.status).clone()
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Registers a status listener.
    ///
    /// The listener is invoked synchronously on every status change, and
    /// once immediately with the current status so there is no
    /// missed-update window. Returns an id for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, listener: impl Fn(&SyncStatus) + Send + Sync + 'static) -> ListenerId {
        let snapshot = self.status();
        listener(&snapshot);

        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).insert(id, Box::new(listener));
        ListenerId(id)
    }

    /// Removes a listener registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, id: ListenerId) {
        lock(&self.listeners).remove(&id.0);
    }

    /// Mutates status under lock, then notifies all listeners with a
    /// snapshot taken inside the same change.
    fn update_status(&self, mutate: impl FnOnce(&mut SyncStatus)) {
        let snapshot = {
            let mut status = lock(&self.status);
            mutate(&mut status);
            status.clone()
        };

        for listener in lock(&self.listeners).values() {
            listener(&snapshot);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns the background loop: interval timer, post-write triggers, and
    /// connectivity transitions. Errors if called twice.
    pub fn start(self: &Arc<Self>) -> SyncResult<()> {
        self.config.validate()?;

        let trigger_rx = lock(&self.trigger_rx)
            .take()
            .ok_or(SyncError::AlreadyStarted)?;
        let shutdown_rx = lock(&self.shutdown_rx)
            .take()
            .ok_or(SyncError::AlreadyStarted)?;

        info!(interval_ms = self.config.interval_ms, "Starting sync engine");
        tokio::spawn(Self::run(self.clone(), trigger_rx, shutdown_rx));
        Ok(())
    }

    /// Stops the background loop. Idempotent; an in-flight cycle finishes.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Main background loop.
    async fn run(
        self: Arc<Self>,
        mut trigger_rx: mpsc::Receiver<()>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut online_rx = self.connectivity.subscribe();

        let mut interval = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately: one startup sync attempt.

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.cycle_for("timer").await;
                }

                Some(_) = trigger_rx.recv() => {
                    self.cycle_for("local write").await;
                }

                changed = online_rx.changed() => {
                    // The sender lives inside self, so this cannot fail
                    // while the loop runs; bail defensively anyway.
                    if changed.is_err() {
                        break;
                    }

                    let online = *online_rx.borrow_and_update();
                    self.update_status(|s| s.is_online = online);

                    if online {
                        self.cycle_for("reconnect").await;
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Sync engine shutting down");
                    break;
                }
            }
        }

        info!("Sync engine stopped");
    }

    async fn cycle_for(&self, reason: &str) {
        debug!(reason, "Sync trigger");
        match self.sync_now().await {
            SyncOutcome::Completed(report) if report.failed > 0 => {
                warn!(
                    reason,
                    synced = report.synced,
                    failed = report.failed,
                    "Sync cycle completed with failures"
                );
            }
            outcome => debug!(reason, ?outcome, "Sync trigger handled"),
        }
    }

    // =========================================================================
    // Cycle
    // =========================================================================

    /// Runs one cycle now (the explicit force-sync entry point).
    ///
    /// Returns immediately with [`SyncOutcome::AlreadyRunning`] when a cycle
    /// is in flight, and skips silently when signed out or offline.
    pub async fn sync_now(&self) -> SyncOutcome {
        let Some(user_id) = self.auth.current_user() else {
            debug!("Skipping sync: not authenticated");
            return SyncOutcome::NotAuthenticated;
        };

        if !self.connectivity.is_online() {
            debug!("Skipping sync: offline");
            // Keep the pending badge fresh even though no cycle runs.
            let pending = self.count_pending().await;
            self.update_status(|s| s.pending_changes = pending);
            return SyncOutcome::Offline;
        }

        // Reentrancy guard: only one cycle at a time.
        if self
            .guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sync already in progress");
            return SyncOutcome::AlreadyRunning;
        }

        self.update_status(|s| {
            s.syncing = true;
            s.errors.clear();
        });

        let report = self.execute_cycle(&user_id).await;

        let pending = self.count_pending().await;
        self.update_status(|s| {
            s.syncing = false;
            s.last_sync = Some(now_ms());
            s.pending_changes = pending;
            s.errors = report.errors.clone();
        });

        self.guard.store(false, Ordering::SeqCst);

        info!(
            synced = report.synced,
            failed = report.failed,
            conflicts = report.conflicts,
            pending,
            "Sync cycle finished"
        );

        SyncOutcome::Completed(report)
    }

    async fn count_pending(&self) -> i64 {
        self.store.lists().count_pending().await + self.store.items().count_pending().await
    }

    /// Pull, then push. Never fails outward: every failure lands in the
    /// report.
    async fn execute_cycle(&self, user_id: &str) -> SyncReport {
        let mut report = SyncReport::default();

        match self.pull(user_id, &mut report).await {
            Ok(()) => {
                self.push(&mut report).await;
            }
            Err(e) => {
                // Push decisions depend on fresh remote state; without a
                // clean pull the cycle ends here and retries next time.
                warn!(error = %e, "Pull failed, skipping push");
                report.record_error("pull", &e);
            }
        }

        report
    }

    // =========================================================================
    // Pull Phase
    // =========================================================================

    /// Merges remote changes since the watermark into the local cache.
    async fn pull(&self, user_id: &str, report: &mut SyncReport) -> SyncResult<()> {
        let watermark = self.store.sync_meta().watermark(user_id).await;
        let pulled_at = now_ms();

        debug!(watermark, "Pull starting");

        let lists = self.remote.fetch_lists(user_id, watermark).await?;
        for remote_list in lists {
            self.merge_list(remote_list, report).await;
        }

        let items = self.remote.fetch_items(user_id, watermark).await?;
        for remote_item in items {
            self.merge_item(remote_item, report).await;
        }

        // Advance only after a clean pull so a failed window is re-fetched.
        self.store.sync_meta().set_watermark(user_id, pulled_at).await?;

        Ok(())
    }

    async fn merge_list(&self, remote: ShoppingList, report: &mut SyncReport) {
        let repo = self.store.lists();

        match repo.get_any(&remote.id).await {
            // Unknown locally: insert as already-synced.
            None => {
                if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                    report.record_error("list pull", &e.into());
                } else {
                    report.synced += 1;
                }
            }

            // No local conflict: remote is authoritative.
            Some(local) if !local.pending_sync => {
                if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                    report.record_error("list pull", &e.into());
                } else {
                    report.synced += 1;
                }
            }

            // Local pending: reconcile.
            Some(local) => {
                report.conflicts += 1;
                match resolve_list(&local.entity, &remote) {
                    // Pending record survives; push resubmits it.
                    Winner::Local => {
                        debug!(id = %remote.id, "List conflict: local wins");
                    }
                    Winner::Remote => {
                        if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                            report.record_error("list pull", &e.into());
                        }
                    }
                }
            }
        }
    }

    async fn merge_item(&self, remote: ShoppingItem, report: &mut SyncReport) {
        let repo = self.store.items();

        match repo.get_any(&remote.id).await {
            None => {
                if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                    report.record_error("item pull", &e.into());
                } else {
                    report.synced += 1;
                }
            }

            Some(local) if !local.pending_sync => {
                if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                    report.record_error("item pull", &e.into());
                } else {
                    report.synced += 1;
                }
            }

            Some(local) => {
                report.conflicts += 1;
                match resolve_item(&local.entity, &remote) {
                    Winner::Local => {
                        debug!(id = %remote.id, "Item conflict: local wins");
                    }
                    Winner::Remote => {
                        debug!(id = %remote.id, "Item conflict: remote wins");
                        if let Err(e) = repo.put(&LocalRecord::synced(remote)).await {
                            report.record_error("item pull", &e.into());
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Push Phase
    // =========================================================================

    /// Drains the pending queue: lists first (items reference lists), then
    /// items. Per-record failures are recorded and the record stays pending
    /// for the next cycle.
    async fn push(&self, report: &mut SyncReport) {
        for record in self.store.lists().pending().await {
            self.push_list(record, report).await;
        }

        for record in self.store.items().pending().await {
            self.push_item(record, report).await;
        }
    }

    async fn push_list(&self, mut record: LocalRecord<ShoppingList>, report: &mut SyncReport) {
        let id = record.entity.id.clone();
        let name = record.entity.name.clone();

        let result = match record.pending_op {
            Some(PendingOp::Create) => self.remote.insert_list(&record.entity).await.map(|_| ()),
            Some(PendingOp::Update) => self
                .remote
                .update_list(&id, &(&record.entity).into())
                .await
                .map(|_| ()),
            Some(PendingOp::Delete) => {
                // The user already confirmed the delete. A remote failure
                // (e.g. already gone) must not resurrect the record or
                // block the rest of the cycle: remove the tombstone
                // regardless.
                if let Err(e) = self.remote.delete_list(&id).await {
                    warn!(id = %id, error = %e, "Remote list delete failed, dropping tombstone anyway");
                }
                match self.store.lists().remove(&id).await {
                    Ok(()) => {
                        report.synced += 1;
                    }
                    Err(e) => report.record_error(&name, &e.into()),
                }
                return;
            }
            None => {
                // pending_sync without an op should not happen; log and skip.
                error!(id = %id, "Pending list without operation, skipping");
                return;
            }
        };

        match result {
            Ok(()) => {
                record.mark_synced();
                match self.store.lists().put(&record).await {
                    Ok(()) => report.synced += 1,
                    Err(e) => report.record_error(&name, &e.into()),
                }
            }
            Err(e) => {
                debug!(id = %id, error = %e, "List push failed, will retry next cycle");
                report.record_error(&name, &e);
            }
        }
    }

    async fn push_item(&self, mut record: LocalRecord<ShoppingItem>, report: &mut SyncReport) {
        let id = record.entity.id.clone();
        let name = record.entity.name.clone();

        let result = match record.pending_op {
            Some(PendingOp::Create) => self.remote.insert_item(&record.entity).await.map(|_| ()),
            Some(PendingOp::Update) => self
                .remote
                .update_item(&id, &(&record.entity).into())
                .await
                .map(|_| ()),
            Some(PendingOp::Delete) => {
                if let Err(e) = self.remote.delete_item(&id).await {
                    warn!(id = %id, error = %e, "Remote item delete failed, dropping tombstone anyway");
                }
                match self.store.items().remove(&id).await {
                    Ok(()) => {
                        report.synced += 1;
                    }
                    Err(e) => report.record_error(&name, &e.into()),
                }
                return;
            }
            None => {
                error!(id = %id, "Pending item without operation, skipping");
                return;
            }
        };

        match result {
            Ok(()) => {
                record.mark_synced();
                match self.store.items().put(&record).await {
                    Ok(()) => report.synced += 1,
                    Err(e) => report.record_error(&name, &e.into()),
                }
            }
            Err(e) => {
                debug!(id = %id, error = %e, "Item push failed, will retry next cycle");
                report.record_error(&name, &e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NoAuth, StaticAuth};
    use crate::remote::MemoryRemote;
    use basket_core::Unit;
    use basket_store::StoreConfig;
    use chrono::{TimeZone, Utc};

    struct Rig {
        engine: Arc<SyncEngine>,
        store: Store,
        remote: Arc<MemoryRemote>,
        connectivity: ConnectivityMonitor,
    }

    async fn rig() -> Rig {
        rig_with(true).await
    }

    async fn rig_with(online: bool) -> Rig {
        // Surface engine logs when a test is run with RUST_LOG set.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let connectivity = ConnectivityMonitor::new(online);
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            remote.clone(),
            Arc::new(StaticAuth::new("u1")),
            connectivity.clone(),
            SyncConfig::default(),
        ));

        Rig {
            engine,
            store,
            remote,
            connectivity,
        }
    }

    fn list(id: &str, name: &str, updated_ms: i64) -> ShoppingList {
        ShoppingList {
            id: id.into(),
            owner_id: "u1".into(),
            name: name.into(),
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

    fn item(id: &str, list_id: &str, checked: bool, updated_ms: i64) -> ShoppingItem {
        ShoppingItem {
            id: id.into(),
            list_id: list_id.into(),
            name: "Milk".into(),
            amount: 1.0,
            unit: Unit::Pieces,
            category: "Other".into(),
            notes: None,
            image_url: None,
            is_checked: checked,
            position: 0,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            updated_at: Utc.timestamp_millis_opt(updated_ms).unwrap(),
        }
    }

    fn completed(outcome: SyncOutcome) -> SyncReport {
        match outcome {
            SyncOutcome::Completed(report) => report,
            other => panic!("expected completed cycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_offline_mutations_reach_remote_after_one_cycle() {
        // P1: create, update, delete performed offline all land remotely.
        let rig = rig().await;

        // Seed a synced list + item that will be mutated "offline".
        rig.remote.seed_list(list("l-keep", "Groceries", 100));
        rig.remote.seed_list(list("l-gone", "Old List", 100));
        rig.remote.seed_item(item("i-gone", "l-keep", false, 100));
        completed(rig.engine.sync_now().await);

        // Offline mutations, written the way the façade writes them.
        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l-new", "Hardware Run", now_ms()),
                PendingOp::Create,
            ))
            .await
            .unwrap();
        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l-keep", "Groceries (edited)", now_ms()),
                PendingOp::Update,
            ))
            .await
            .unwrap();
        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l-gone", "Old List", now_ms()),
                PendingOp::Delete,
            ))
            .await
            .unwrap();
        rig.store
            .items()
            .put(&LocalRecord::pending(
                item("i-gone", "l-keep", false, now_ms()),
                PendingOp::Delete,
            ))
            .await
            .unwrap();

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.failed, 0);

        // Create survived as insert
        assert_eq!(rig.remote.list_snapshot("l-new").unwrap().name, "Hardware Run");
        // Update survived as patch
        assert_eq!(
            rig.remote.list_snapshot("l-keep").unwrap().name,
            "Groceries (edited)"
        );
        // Deletes result in remote absence
        assert!(rig.remote.list_snapshot("l-gone").is_none());
        assert!(rig.remote.item_snapshot("i-gone").is_none());

        // Local queue fully drained; tombstones physically gone.
        assert_eq!(rig.store.lists().count_pending().await, 0);
        assert_eq!(rig.store.items().count_pending().await, 0);
        assert!(rig.store.lists().get_any("l-gone").await.is_none());
    }

    #[tokio::test]
    async fn test_resync_with_no_mutations_is_idempotent() {
        // P2: a second cycle right after a clean one changes nothing.
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Groceries", 100));

        completed(rig.engine.sync_now().await);

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report, SyncReport::default());
        assert_eq!(rig.engine.status().pending_changes, 0);
    }

    #[tokio::test]
    async fn test_item_conflict_later_remote_timestamp_wins() {
        // Two devices: this one checked at T=100 offline, the other
        // unchecked at T=200 online. Remote must win: item ends unchecked.
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Groceries", 0));
        rig.remote.seed_item(item("i1", "l1", false, 200));

        rig.store
            .items()
            .put(&LocalRecord::pending(
                item("i1", "l1", true, 100),
                PendingOp::Update,
            ))
            .await
            .unwrap();

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.conflicts, 1);

        let local = rig.store.items().get("i1").await.unwrap();
        assert!(!local.entity.is_checked);
        assert!(!local.pending_sync);
        assert!(!rig.remote.item_snapshot("i1").unwrap().is_checked);
    }

    #[tokio::test]
    async fn test_item_conflict_later_local_timestamp_wins_and_pushes() {
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Groceries", 0));
        rig.remote.seed_item(item("i1", "l1", false, 100));

        rig.store
            .items()
            .put(&LocalRecord::pending(
                item("i1", "l1", true, 200),
                PendingOp::Update,
            ))
            .await
            .unwrap();

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.conflicts, 1);

        // Local survived the pull and was resubmitted during push.
        assert!(rig.remote.item_snapshot("i1").unwrap().is_checked);
        assert!(!rig.store.items().get("i1").await.unwrap().pending_sync);
    }

    #[tokio::test]
    async fn test_list_conflict_local_always_wins() {
        // P4: even a fresher remote list edit loses to a pending local one.
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Renamed Elsewhere", 999_999));

        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l1", "My Name", 100),
                PendingOp::Update,
            ))
            .await
            .unwrap();

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.conflicts, 1);
        assert_eq!(report.failed, 0);

        assert_eq!(rig.remote.list_snapshot("l1").unwrap().name, "My Name");
        assert_eq!(rig.store.lists().get("l1").await.unwrap().entity.name, "My Name");
    }

    #[tokio::test]
    async fn test_concurrent_trigger_returns_already_running() {
        // P6: two rapid force-syncs yield exactly one executing cycle.
        let rig = rig().await;
        rig.remote.set_latency(Duration::from_millis(200));

        let engine = rig.engine.clone();
        let first = tokio::spawn(async move { engine.sync_now().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rig.engine.sync_now().await, SyncOutcome::AlreadyRunning);

        assert!(matches!(
            first.await.unwrap(),
            SyncOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn test_skips_when_signed_out_or_offline() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        let engine = Arc::new(SyncEngine::new(
            store,
            Arc::new(MemoryRemote::new()),
            Arc::new(NoAuth),
            ConnectivityMonitor::new(true),
            SyncConfig::default(),
        ));
        assert_eq!(engine.sync_now().await, SyncOutcome::NotAuthenticated);

        let rig = rig_with(false).await;
        assert_eq!(rig.engine.sync_now().await, SyncOutcome::Offline);
    }

    #[tokio::test]
    async fn test_push_failure_keeps_record_pending_for_next_cycle() {
        let rig = rig().await;

        // Update of an item the remote doesn't know fails the push.
        rig.store
            .items()
            .put(&LocalRecord::pending(
                item("i1", "l1", false, 100),
                PendingOp::Update,
            ))
            .await
            .unwrap();

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Milk:"));

        // Still pending, still retried - no retry limit.
        assert_eq!(rig.store.items().count_pending().await, 1);
        assert_eq!(rig.engine.status().pending_changes, 1);

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_remote_delete_failure_still_drops_tombstone() {
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Groceries", 0));
        rig.remote.seed_item(item("i1", "l1", false, 0));
        completed(rig.engine.sync_now().await);

        rig.store
            .items()
            .put(&LocalRecord::pending(
                item("i1", "l1", false, now_ms()),
                PendingOp::Delete,
            ))
            .await
            .unwrap();

        rig.remote.set_fail_deletes(true);
        let report = completed(rig.engine.sync_now().await);

        // Local bookkeeping treats the delete as done either way: no zombie.
        assert_eq!(report.failed, 0);
        assert!(rig.store.items().get_any("i1").await.is_none());
        // The remote copy survives until its own delete succeeds elsewhere.
        assert!(rig.remote.item_snapshot("i1").is_some());
    }

    #[tokio::test]
    async fn test_pull_failure_skips_push_and_keeps_watermark() {
        let rig = rig().await;
        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l1", "Queued", 100),
                PendingOp::Create,
            ))
            .await
            .unwrap();

        rig.remote.set_available(false);
        let report = completed(rig.engine.sync_now().await);

        assert_eq!(report.failed, 1);
        assert_eq!(rig.remote.list_count(), 0);
        assert_eq!(rig.store.sync_meta().watermark("u1").await, 0);

        // Service recovers: next cycle drains the queue.
        rig.remote.set_available(true);
        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.failed, 0);
        assert_eq!(rig.remote.list_count(), 1);
        assert!(rig.store.sync_meta().watermark("u1").await > 0);
    }

    #[tokio::test]
    async fn test_watermark_limits_next_pull_window() {
        let rig = rig().await;
        rig.remote.seed_list(list("l1", "Groceries", 100));
        completed(rig.engine.sync_now().await);

        // A remote edit stamped after the watermark is picked up next cycle.
        let watermark = rig.store.sync_meta().watermark("u1").await;
        rig.remote
            .seed_list(list("l1", "Fresh Edit", watermark + 1_000));

        let report = completed(rig.engine.sync_now().await);
        assert_eq!(report.synced, 1);
        assert_eq!(
            rig.store.lists().get("l1").await.unwrap().entity.name,
            "Fresh Edit"
        );
    }

    #[tokio::test]
    async fn test_listeners_get_current_status_immediately_and_on_change() {
        let rig = rig().await;

        let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = rig
            .engine
            .subscribe(move |status| lock(&sink).push(status.syncing));

        // Immediate emission on subscribe
        assert_eq!(lock(&seen).as_slice(), &[false]);

        completed(rig.engine.sync_now().await);

        // syncing flipped true at cycle start, false at cycle end
        let observed = lock(&seen).clone();
        assert!(observed.contains(&true));
        assert_eq!(*observed.last().unwrap(), false);

        rig.engine.unsubscribe(id);
        let before = lock(&seen).len();
        completed(rig.engine.sync_now().await);
        assert_eq!(lock(&seen).len(), before);
    }

    #[tokio::test]
    async fn test_reconnect_triggers_cycle() {
        let rig = rig_with(false).await;
        rig.engine.start().unwrap();
        assert!(matches!(rig.engine.start(), Err(SyncError::AlreadyStarted)));

        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l1", "Queued Offline", 100),
                PendingOp::Create,
            ))
            .await
            .unwrap();

        rig.connectivity.set_online();

        // Give the background loop a moment to run the reconnect cycle.
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if rig.remote.list_count() == 1 {
                break;
            }
        }
        assert_eq!(rig.remote.list_count(), 1);
        assert!(rig.engine.status().is_online);

        rig.engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_handle_nudge_wakes_background_loop() {
        let rig = rig().await;
        rig.engine.start().unwrap();

        rig.store
            .lists()
            .put(&LocalRecord::pending(
                list("l1", "Nudged", 100),
                PendingOp::Create,
            ))
            .await
            .unwrap();

        rig.engine.handle().request_sync();

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if rig.remote.list_count() == 1 {
                break;
            }
        }
        assert_eq!(rig.remote.list_count(), 1);

        rig.engine.shutdown().await;
    }
}
