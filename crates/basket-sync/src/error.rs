//! # Sync Error Types
//!
//! Error types for routing, remote-service, and cycle failures.
//!
//! Most remote failures never reach callers: the façade falls back to the
//! local cache on reads and to a pending write on writes, and the engine
//! records push failures in the cycle report instead of bailing. What *does*
//! surface is typed here.

use thiserror::Error;

use basket_core::ValidationError;
use basket_store::StoreError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering façade and engine failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Caller-Facing Errors
    // =========================================================================
    /// Entity not found - update/toggle on a record absent from the local
    /// cache while offline.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// No authenticated user; façade operations need an owner scope.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Input validation failed before any storage or remote call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Bulk import payload didn't match any accepted shape.
    #[error("Invalid import payload: {0}")]
    InvalidImport(String),

    // =========================================================================
    // Remote Service Errors
    // =========================================================================
    /// The remote data service rejected or failed a call.
    #[error("Remote service error: {0}")]
    Remote(String),

    // =========================================================================
    // Local Store Errors
    // =========================================================================
    /// A local cache write failed (reads degrade silently, writes do not).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Engine was started twice.
    #[error("Sync engine already started")]
    AlreadyStarted,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl SyncError {
    /// True when the operation can be retried on a later cycle.
    ///
    /// Remote failures are retryable (the record stays pending); validation
    /// and not-found failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Remote(_) | SyncError::Store(_))
    }
}
