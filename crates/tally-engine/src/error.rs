//! # Engine Error Type
//!
//! The full error taxonomy the controllers render.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tally-core ValidationError ──┐                                         │
//! │  tally-core ItemUnavailability├──► EngineError ──► HTTP response        │
//! │  tally-db   DbError ──────────┘        │                                │
//! │                                        ▼                                │
//! │  { "code": "ITEM_UNAVAILABLE",                                          │
//! │    "message": "Espresso is unavailable (OutOfStock): 0 on hand",        │
//! │    ... }                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every business variant carries enough structure for a field-level or
//! item-level message; nothing is flattened to a bare string before the
//! controller layer.

use serde::Serialize;
use thiserror::Error;

use tally_core::{ItemUnavailability, ValidationError};
use tally_db::DbError;

/// Errors surfaced by the engine services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad input shape or business-rule violation on the request itself.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced entity is absent or inactive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// State conflict: no open shift, duplicate non-idempotent void,
    /// already-void sale, unconfigured deployment.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization/scope violation by a known actor.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No actor identity on the request.
    #[error("actor identity is required")]
    Unauthorized,

    /// The availability/stock gate rejected an item.
    #[error("{0}")]
    ItemUnavailable(ItemUnavailability),

    /// Storage failure after retries were exhausted.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

/// Machine-readable error code, serialized SCREAMING_SNAKE_CASE for the
/// admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Conflict,
    Forbidden,
    Unauthorized,
    ItemUnavailable,
    StorageError,
}

impl EngineError {
    /// Shorthand for a not-found failure.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a conflict failure.
    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict(message.into())
    }

    /// Shorthand for a forbidden failure.
    pub fn forbidden(message: impl Into<String>) -> Self {
        EngineError::Forbidden(message.into())
    }

    /// The machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::Conflict(_) => ErrorCode::Conflict,
            EngineError::Forbidden(_) => ErrorCode::Forbidden,
            EngineError::Unauthorized => ErrorCode::Unauthorized,
            EngineError::ItemUnavailable(_) => ErrorCode::ItemUnavailable,
            EngineError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Whether re-running the whole operation may succeed. Only transient
    /// storage faults qualify; business errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Storage(db) if db.is_retryable())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::not_found("Sale", "s1").code(),
            ErrorCode::NotFound
        );
        assert_eq!(EngineError::Unauthorized.code(), ErrorCode::Unauthorized);
        assert_eq!(
            EngineError::conflict("no open shift").code(),
            ErrorCode::Conflict
        );
    }

    #[test]
    fn test_only_transient_storage_is_retryable() {
        let busy = EngineError::Storage(DbError::Busy("database is locked".to_string()));
        assert!(busy.is_retryable());

        let conflict = EngineError::conflict("already void");
        assert!(!conflict.is_retryable());

        let not_found = EngineError::Storage(DbError::not_found("Sale", "s1"));
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = EngineError::not_found("Product", "p9");
        assert_eq!(err.to_string(), "Product not found: p9");
    }
}
