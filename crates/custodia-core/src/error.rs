//! Error Types
//!
//! This module provides the domain error taxonomy shared by every custodia
//! service. All fallible operations in the workspace return [`Result`].
//!
//! # Example
//!
//! ```
//! use custodia_core::{DomainError, Result};
//!
//! fn find_device(code: &str) -> Result<String> {
//!     if code.is_empty() {
//!         return Err(DomainError::not_found("Device", code));
//!     }
//!     Ok(format!("Device {}", code))
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// Domain error taxonomy for custodia.
///
/// Exactly four kinds, all deterministic and non-retryable. Every one of
/// them aborts the surrounding unit-of-work scope, so a failed operation
/// never leaves partial state behind. HTTP-layer collaborators translate
/// these to status codes; the core only raises them.
///
/// # Variants
///
/// - `EntityNotFound` - Referenced business key does not exist (HTTP 404)
/// - `InactiveEntity` - Entity exists but is flagged inactive (HTTP 409)
/// - `BusinessRuleViolation` - Invariant violation such as a duplicate key
///   or a conflicting open loan (HTTP 409)
/// - `InvalidInput` - Required argument missing or unusable (HTTP 400)
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainError {
    /// Referenced business key does not exist.
    ///
    /// Use when a lookup by document number, device code, or username
    /// returns nothing.
    #[error("{resource} not found: {key}")]
    EntityNotFound {
        /// The kind of entity that was not found (e.g., "Employee").
        resource: &'static str,
        /// The business key that was looked up.
        key: String,
    },

    /// Entity exists but its active flag is false.
    ///
    /// Use when an operation requires an active entity and the catalog
    /// entry has been disabled.
    #[error("{resource} {key} is inactive")]
    InactiveEntity {
        /// The kind of entity that is inactive.
        resource: &'static str,
        /// The business key of the inactive entity.
        key: String,
    },

    /// A business invariant was violated.
    ///
    /// Use for duplicate business keys, conflicting open loans, empty
    /// identifiers after normalization, and malformed return requests.
    #[error("{message}")]
    BusinessRuleViolation {
        /// Description of the violated rule.
        message: String,
    },

    /// A required input was missing or unusable.
    ///
    /// Raised by the shift calculator when no timestamp is supplied.
    #[error("{message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },
}

impl DomainError {
    /// Build an [`DomainError::EntityNotFound`] for the given resource and key.
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        Self::EntityNotFound {
            resource,
            key: key.into(),
        }
    }

    /// Build an [`DomainError::InactiveEntity`] for the given resource and key.
    pub fn inactive(resource: &'static str, key: impl Into<String>) -> Self {
        Self::InactiveEntity {
            resource,
            key: key.into(),
        }
    }

    /// Build a [`DomainError::BusinessRuleViolation`] with the given message.
    pub fn rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation {
            message: message.into(),
        }
    }

    /// Build an [`DomainError::InvalidInput`] with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable machine-readable name of the error kind, for log fields and
    /// collaborator dispatch.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::InactiveEntity { .. } => "inactive_entity",
            Self::BusinessRuleViolation { .. } => "business_rule_violation",
            Self::InvalidInput { .. } => "invalid_input",
        }
    }
}

/// Type alias for Results using `DomainError`.
///
/// This provides a convenient shorthand for function signatures:
///
/// ```
/// use custodia_core::{DomainError, Result};
///
/// fn example() -> Result<String> {
///     Ok("success".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, DomainError>;
