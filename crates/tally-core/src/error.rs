//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── ValidationError     - field-addressable request violations        │
//! │  └── ItemUnavailability  - payload for availability/stock gate hits    │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError             - database operation failures                 │
//! │                                                                         │
//! │  tally-engine errors                                                   │
//! │  └── EngineError         - full taxonomy the controllers render        │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → HTTP response                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, item, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each variant carries enough structure for a field-level message

use serde::Serialize;
use thiserror::Error;

use crate::types::{AvailabilityReason, ItemKind};

/// Input validation errors.
///
/// These occur when a request doesn't meet requirements and are raised
/// before any database work happens (fail fast).
#[derive(Debug, Clone, Error, Serialize)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid shape (e.g. both payment representations supplied).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Tendered payments do not balance against the computed total.
    #[error("payments sum to {paid_cents} but sale total is {expected_cents}")]
    TenderMismatch {
        expected_cents: i64,
        paid_cents: i64,
    },
}

/// Structured payload for an availability/stock gate failure.
///
/// Carries everything the register UI needs to render an item-level message:
/// which item, why, and how many are actually on hand.
#[derive(Debug, Clone, Serialize)]
pub struct ItemUnavailability {
    pub kind: ItemKind,
    pub item_id: String,
    pub name: String,
    pub reason: AvailabilityReason,
    pub on_hand: Option<i64>,
}

impl std::fmt::Display for ItemUnavailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.on_hand {
            Some(qty) => write!(
                f,
                "{} is unavailable ({:?}): {} on hand",
                self.name, self.reason, qty
            ),
            None => write!(f, "{} is unavailable ({:?})", self.name, self.reason),
        }
    }
}

/// Result type alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::TenderMismatch {
            expected_cents: 12000,
            paid_cents: 11000,
        };
        assert_eq!(
            err.to_string(),
            "payments sum to 11000 but sale total is 12000"
        );
    }

    #[test]
    fn test_item_unavailability_display() {
        let unavailable = ItemUnavailability {
            kind: ItemKind::Product,
            item_id: "p1".to_string(),
            name: "Espresso".to_string(),
            reason: AvailabilityReason::OutOfStock,
            on_hand: Some(0),
        };
        assert_eq!(
            unavailable.to_string(),
            "Espresso is unavailable (OutOfStock): 0 on hand"
        );
    }
}
