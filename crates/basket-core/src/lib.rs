//! # basket-core: Pure Domain Layer for Basket
//!
//! This crate is the **heart** of the Basket offline-first core. It contains
//! the entity types, the local record wrapper used by the cache, and the
//! conflict-resolution rules - all as plain data and pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Basket Architecture                         │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 Application / Web Frontend                │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │            basket-sync (engine + façade)                  │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │            ★ basket-core (THIS CRATE) ★                   │  │
//! │  │                                                           │  │
//! │  │  ┌─────────┐  ┌─────────┐  ┌───────────┐  ┌────────────┐  │  │
//! │  │  │  types  │  │ record  │  │ reconcile │  │ validation │  │  │
//! │  │  │  List   │  │ wrapper │  │  rules    │  │   rules    │  │  │
//! │  │  │  Item   │  │ pending │  │  Winner   │  │   checks   │  │  │
//! │  │  └─────────┘  └─────────┘  └───────────┘  └────────────┘  │  │
//! │  │                                                           │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │            basket-store (SQLite local cache)              │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity types (ShoppingList, ShoppingItem, Unit) and patches
//! - [`record`] - Local record wrapper with pending-operation tagging
//! - [`reconcile`] - Conflict resolution between local and remote versions
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: reconciliation is deterministic - same input, same winner
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Millisecond Timestamps**: conflicts compare `updated_at` as ms since epoch
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod reconcile;
pub mod record;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use basket_core::ShoppingList` instead of
// `use basket_core::types::ShoppingList`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use reconcile::{resolve_item, resolve_list, Winner};
pub use record::{now_ms, LocalRecord, PendingOp, SyncMetadata, Syncable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default category label for items created without one.
///
/// The category is a free-form grouping label; the UI sorts items by
/// category then position, so every item needs one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Maximum length for list and item names.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum number of items accepted in a single bulk import.
///
/// Prevents a malformed import payload from flooding the pending queue.
pub const MAX_IMPORT_ITEMS: usize = 500;
