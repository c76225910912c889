//! # Error Types
//!
//! Domain-specific error types for akari-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  akari-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  akari-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── PosError         - CoreError | DbError, returned by services      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → CLI error output       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::types::CartLineStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The promo code exists but cannot be applied.
    #[error("Promo code {code} cannot be applied: {reason}")]
    InvalidPromoCode { code: String, reason: PromoRejection },

    /// A stock adjustment would drive the product quantity below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// adjust_stock(product, -5)
    ///      │
    ///      ▼
    /// conditional UPDATE matches no row (stock = 3)
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A concurrent checkout touched the same cart lines first.
    ///
    /// The only retryable error: the whole operation rolled back, so the
    /// caller may run it again with the same inputs.
    #[error("Transaction conflict: {reason}")]
    TransactionConflict { reason: String },

    /// Checkout found no pending cart lines for the user.
    #[error("User {user_id} has no pending cart lines")]
    EmptyCart { user_id: String },

    /// A cart line is not in the state the operation requires.
    #[error("Cart line {line_id} is {status}, cannot perform operation")]
    InvalidLineStatus {
        line_id: String,
        status: CartLineStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a TransactionConflict error.
    pub fn conflict(reason: impl Into<String>) -> Self {
        CoreError::TransactionConflict {
            reason: reason.into(),
        }
    }

    /// Returns true when retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::TransactionConflict { .. })
    }
}

/// Why a promo code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoRejection {
    /// The code has been switched off.
    Inactive,
    /// The code expired at the end of the given day.
    Expired { on: NaiveDate },
}

impl fmt::Display for PromoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromoRejection::Inactive => write!(f, "code is inactive"),
            PromoRejection::Expired { on } => write!(f, "code expired on {}", on),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs or any row is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
