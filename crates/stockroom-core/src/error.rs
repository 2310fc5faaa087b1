//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── AdmissionError   - Rejected scans (admission.rs)                  │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (barcode, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::admission::AdmissionError;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Batch cannot be found.
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A scanned code was rejected by the admission state machine.
    ///
    /// ## User Workflow
    /// ```text
    /// Operator scans "BATCH5-01" (already on the shelf)
    ///      │
    ///      ▼
    /// AdmissionRejected(DuplicateBarcode { code: "BATCH5-01" })
    ///      │
    ///      ▼
    /// Scanner screen shows: "Barcode BATCH5-01 is already registered"
    /// ```
    #[error(transparent)]
    AdmissionRejected(#[from] AdmissionError),

    /// Admitted count is inconsistent with the batch quantity.
    #[error("Batch {batch_id} has {admitted} admitted units but quantity {quantity}")]
    AdmittedExceedsQuantity {
        batch_id: String,
        admitted: i64,
        quantity: i64,
    },

    /// A batch edit would shrink quantity below the units already scanned.
    #[error("Batch {batch_id} already has {admitted} admitted units; quantity cannot be {requested}")]
    QuantityBelowAdmitted {
        batch_id: String,
        admitted: i64,
        requested: i64,
    },

    /// Batch still has inventory records referencing it.
    #[error("Batch {batch_id} has {records} inventory records and cannot be deleted")]
    BatchHasInventory { batch_id: String, records: i64 },

    /// Category move would make a node its own ancestor.
    #[error("Category {id} cannot be moved under its own descendant {target}")]
    CategoryCycle { id: String, target: String },

    /// Category cannot be found in the tree.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Category tree would exceed its depth limit.
    #[error("Category tree cannot be deeper than {max} levels")]
    CategoryTooDeep { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Invalid format (e.g., invalid UUID, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Attribute key has no matching custom field.
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
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
        let err = CoreError::QuantityBelowAdmitted {
            batch_id: "b-1".to_string(),
            admitted: 3,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Batch b-1 already has 3 admitted units; quantity cannot be 2"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("code");
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_admission_error_is_transparent() {
        let err: CoreError = AdmissionError::DuplicateBarcode {
            code: "BATCH5-01".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Barcode BATCH5-01 is already registered");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
