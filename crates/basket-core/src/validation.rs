//! # Validation Module
//!
//! Input validation for the façade's write operations. Checks run before any
//! storage or remote call, so a bad payload never reaches the pending queue.
//!
//! ## Usage
//! ```rust
//! use basket_core::validation::{validate_name, validate_amount};
//!
//! validate_name("Milk").unwrap();
//! validate_amount(2.0).unwrap();
//! assert!(validate_amount(0.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_IMPORT_ITEMS, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a list or item display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`MAX_NAME_LEN`] characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an item amount.
///
/// Amounts are strictly positive; zero would render as an empty entry and
/// negative amounts have no meaning on a shopping list.
pub fn validate_amount(amount: f64) -> ValidationResult<()> {
    if !(amount > 0.0) {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a bulk import batch size.
pub fn validate_import_size(count: usize) -> ValidationResult<()> {
    if count > MAX_IMPORT_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_IMPORT_ITEMS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Milk").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1.0).is_ok());
        assert!(validate_amount(0.25).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-3.0).is_err());
        // NaN is not positive either
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_import_size() {
        assert!(validate_import_size(10).is_ok());
        assert!(validate_import_size(MAX_IMPORT_ITEMS).is_ok());
        assert!(validate_import_size(MAX_IMPORT_ITEMS + 1).is_err());
    }
}
