//! # basket-sync: Sync Engine for Basket
//!
//! Offline-first synchronization between the local SQLite cache
//! (basket-store) and a remote data service, plus the façade the rest of the
//! application calls.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        basket-sync                                  │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                  ListService (Façade)                         │  │
//! │  │                                                               │  │
//! │  │  Every read/write from the app lands here.                    │  │
//! │  │  online  → remote call, mirror result into cache as synced    │  │
//! │  │  offline → cache write tagged pending, nudge the engine       │  │
//! │  └───────────────┬──────────────────────────────┬────────────────┘  │
//! │                  │                              │                   │
//! │                  ▼                              ▼                   │
//! │  ┌────────────────────────┐      ┌─────────────────────────────┐    │
//! │  │      SyncEngine        │      │  ConnectivityMonitor        │    │
//! │  │                        │      │                             │    │
//! │  │  pull (merge remote)   │◄─────│  watch channel; flipping    │    │
//! │  │  then push (drain      │      │  online triggers a cycle    │    │
//! │  │  pending queue)        │      └─────────────────────────────┘    │
//! │  │                        │                                         │
//! │  │  timer + triggers,     │      ┌─────────────────────────────┐    │
//! │  │  reentrancy guard,     │─────►│  RemoteStore / AuthProvider │    │
//! │  │  status observers      │      │  (async trait seams)        │    │
//! │  └────────────────────────┘      └─────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`auth`] - Authenticated-user identity seam
//! - [`config`] - Sync configuration (interval, trigger queue depth)
//! - [`connectivity`] - Online/offline signal
//! - [`engine`] - Pull-then-push sync cycles, status, observers
//! - [`error`] - Sync error types
//! - [`facade`] - Dual-path read/write entry point
//! - [`import`] - Bulk import payload parsing
//! - [`remote`] - Remote data service seam + in-memory reference impl
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use basket_core::NewList;
//! use basket_store::{Store, StoreConfig};
//! use basket_sync::{
//!     ConnectivityMonitor, ListService, MemoryRemote, StaticAuth,
//!     SyncConfig, SyncEngine,
//! };
//!
//! let store = Store::open(StoreConfig::new("./basket.db")).await?;
//! let remote = Arc::new(MemoryRemote::new());
//! let auth = Arc::new(StaticAuth::new("user-1"));
//! let connectivity = ConnectivityMonitor::new(true);
//!
//! let engine = Arc::new(SyncEngine::new(
//!     store.clone(),
//!     remote.clone(),
//!     auth.clone(),
//!     connectivity.clone(),
//!     SyncConfig::default(),
//! ));
//! engine.start()?;
//!
//! let service = ListService::new(store, remote, auth, connectivity, engine.handle());
//! let list = service
//!     .create_list(NewList { name: "Groceries".into(), ..Default::default() })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod facade;
pub mod import;
pub mod remote;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthProvider, NoAuth, StaticAuth};
pub use config::SyncConfig;
pub use connectivity::ConnectivityMonitor;
pub use engine::{ListenerId, SyncEngine, SyncHandle, SyncOutcome, SyncReport, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use facade::ListService;
pub use import::{parse_import, ImportList};
pub use remote::{MemoryRemote, RemoteStore};
