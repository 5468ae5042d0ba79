//! # Error Types
//!
//! Domain-specific error types for pharma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  pharma-core errors (this file)                                     │
//! │  ├── CoreError        - Settlement / allocation failures            │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  pharma-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── SettlementError  - Core + Db combined at the service seam      │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → SettlementError → caller       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core settlement errors.
///
/// These represent business rule violations during sale or return
/// settlement. They are returned to the caller as structured results and
/// surfaced to the end user via their `Display` messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line is unusable as submitted.
    ///
    /// Raised when a cart item lacks a product identity or display name,
    /// or carries a quantity outside the accepted range. The whole sale is
    /// rejected before anything is written.
    #[error("Invalid cart item: {reason}")]
    InvalidCartItem { reason: String },

    /// Not enough stock across all batches to cover a requested quantity.
    ///
    /// Reports the product display name and the total available quantity
    /// so the cashier can offer a partial sale.
    #[error("Insufficient stock for {product}: only {available} available")]
    InsufficientStock { product: String, available: i64 },

    /// A return request is unusable as submitted.
    ///
    /// Raised when the target sale identity is absent/malformed or the
    /// return item list is empty.
    #[error("Invalid return request: {reason}")]
    InvalidReturnRequest { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidCartItem error.
    pub fn invalid_cart_item(reason: impl Into<String>) -> Self {
        CoreError::InvalidCartItem {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidReturnRequest error.
    pub fn invalid_return(reason: impl Into<String>) -> Self {
        CoreError::InvalidReturnRequest {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet structural requirements. Used for
/// early validation at collaborator boundaries, before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Panadol 500mg".to_string(),
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Panadol 500mg: only 3 available"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product name".to_string(),
        };
        assert_eq!(err.to_string(), "product name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
