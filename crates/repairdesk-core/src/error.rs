//! # Error Types
//!
//! Domain-specific error types for repairdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  repairdesk-core errors (this file)                                    │
//! │  ├── CoreError        - Settlement rule violations                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  repairdesk-db errors (separate crate)                                 │
//! │  └── DbError          - Storage failures, NotFound, wraps CoreError    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → UI layer                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is reported to the caller before anything is written, so
//! the UI can show it without having to repair stock afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::WorkStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification the UI layer switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A referenced record, product or purchase does not exist.
    NotFound,
    /// The input broke a constraint (quantity, duplicate name, lifecycle...).
    Validation,
    /// Applying the operation would leave stock in an impossible state.
    Consistency,
    /// The store itself failed.
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Settlement rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Applying a stock delta would drive on-hand quantity below zero.
    ///
    /// ## When This Occurs
    /// ```text
    /// Part "Screen iPhone 13" stock = 2
    ///      │
    ///      ▼
    /// Job attaches 3 units  → delta = -3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 2, requested: 3 }
    /// ```
    /// Only raised when negative stock is not allowed by configuration.
    #[error("Insufficient stock for {name} ({product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// A work-status change that the job lifecycle does not allow.
    #[error("Job {record_id} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        record_id: String,
        from: WorkStatus,
        to: WorkStatus,
    },

    /// A job identifier that is not of the form `JOB-YYYY-NNNN`.
    #[error("Invalid job number: {0}")]
    InvalidJobNumber(String),

    /// A non-zero stock adjustment was requested for a service entry.
    #[error("{0} is a service and has no stock")]
    ServiceStock(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InsufficientStock { .. } => ErrorKind::Consistency,
            CoreError::InvalidStatusTransition { .. }
            | CoreError::InvalidJobNumber(_)
            | CoreError::ServiceStock(_)
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
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

    /// Invalid format (e.g., invalid UUID, invalid job code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (product name, product listed twice on a job).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Referenced entity is still in use and cannot be removed.
    #[error("{entity} '{id}' is still referenced by {referenced_by}")]
    InUse {
        entity: String,
        id: String,
        referenced_by: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
