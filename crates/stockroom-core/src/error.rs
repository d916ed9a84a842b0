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
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-store errors (separate crate)                               │
//! │  └── StoreError       - File, codec and lock failures                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, quantities)
//! 3. Errors are enum variants, never String
//! 4. Business failures are never recovered internally; they reach the caller

use thiserror::Error;

use crate::types::EntityId;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures raised by order processing and receiving.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced customer, product, supplier or order does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },

    /// The request itself is malformed: no line items, or a quantity ≤ 0.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested quantity exceeds the stock tracked for the product.
    ///
    /// ## User Workflow
    /// ```text
    /// create_order([(pen, 150), (pen, 100)])   stock(pen) = 200
    ///      │
    ///      ▼
    /// line 1: 150 ≤ 200 → tracked stock 50
    ///      │
    ///      ▼
    /// line 2: 100 > 50
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Pen", available: 50, requested: 100 }
    /// ```
    #[error("Insufficient stock for {name} (#{product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: EntityId,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The session's role does not permit the operation.
    #[error("Role {role} is not allowed to {action}")]
    Forbidden { role: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: EntityId) -> Self {
        CoreError::NotFound { entity, id }
    }

    /// Creates an InvalidRequest error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidRequest(reason.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when field values don't meet requirements.
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

    /// Invalid format (e.g., malformed amount or email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
