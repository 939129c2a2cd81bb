//! # Error Types
//!
//! Domain-specific error types for basket-core.
//!
//! ## Error Hierarchy
//! ```text
//! basket-core errors (this file)
//! ├── CoreError        - General domain errors
//! └── ValidationError  - Input validation failures
//!
//! basket-store errors (separate crate)
//! └── StoreError       - Local cache failures
//!
//! basket-sync errors (separate crate)
//! └── SyncError        - Routing, remote-service, and cycle failures
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, field)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown measurement unit label.
    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements; they are checked
/// before any storage or remote call runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Collection exceeds the allowed size.
    #[error("{field} cannot contain more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownUnit("bushel".into());
        assert_eq!(err.to_string(), "Unknown unit: 'bushel'");

        let err = ValidationError::Required {
            field: "name".into(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::MustBePositive {
            field: "amount".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
