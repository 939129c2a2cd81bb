//! # basket-store: Local Store for Basket
//!
//! Durable client-side cache over SQLite, using sqlx for async access.
//! This is the offline half of the dual-path core: every record the façade
//! or the sync engine touches locally lives here.
//!
//! ## Collections
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      basket-store                              │
//! │                                                                │
//! │   lists          keyed by id, indexed by owner_id              │
//! │   items          keyed by id, indexed by list_id               │
//! │   sync_metadata  keyed by user_id (pull watermark)             │
//! │                                                                │
//! │   Every lists/items row = entity columns + sync wrapper:       │
//! │   last_modified, pending_sync, pending_op                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! This cache is not a system of record. Read-path storage errors are logged
//! and degrade to "no data" (`None`/empty) so a broken cache never breaks a
//! read; write-path errors propagate as [`StoreError`] so the façade can
//! decide fallback behavior.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use basket_store::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::new("./basket.db")).await?;
//! let lists = store.lists().list_by_owner("user-1").await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Store, StoreConfig};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::list::ListRepository;
pub use repository::meta::SyncMetaRepository;
