//! # Error Types
//!
//! Domain-specific error types for gesticom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gesticom-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations + engine outcomes     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gesticom-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  gesticom-api errors                                                   │
//! │  └── ApiError         - What the web front end sees (serialized)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Front end              │
//! │        DbError ─────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, sale id, ...)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are the outcomes the cart, the sale engine and the void path can
/// report. None of them is swallowed: the API turns each one into a
/// user-visible message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input was malformed (empty cart, non-positive quantity, ...).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Product has no stock at all and cannot be added to a cart.
    #[error("{product} is out of stock")]
    OutOfStock { product: String },

    /// Requested quantity exceeds the available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Set quantity (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Coca-Cola", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Coca-Cola"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The cart has no line for this product.
    #[error("Product {0} is not in the cart")]
    CartLineNotFound(String),

    /// The operator lacks the role required for the action.
    #[error("Permission denied: {action} requires the {required} role")]
    PermissionDenied { action: String, required: String },

    /// The sale was already voided.
    #[error("Sale {0} is already voided")]
    AlreadyVoided(String),

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Deleting a sale that is still completed
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// The atomic unit could not be committed.
    ///
    /// Transient: the caller may retry the whole operation from scratch.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl CoreError {
    /// Creates a PermissionDenied error for an action gated on a role.
    pub fn permission_denied(action: impl Into<String>, required: impl Into<String>) -> Self {
        CoreError::PermissionDenied {
            action: action.into(),
            required: required.into(),
        }
    }

    /// True for failures where retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::TransactionFailed(_))
    }
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

    /// Invalid format (e.g., invalid email, invalid national id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A sale must contain at least one line.
    #[error("Cart is empty")]
    EmptyCart,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
