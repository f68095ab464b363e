//! custodia Core Library
//!
//! Shared types for the custodia workspace.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (LoanId, AuditEventId, ActorId)
//! - [`error`] - Standardized error types (DomainError)
//!
//! # Example
//!
//! ```
//! use custodia_core::{ActorId, DomainError, LoanId, Result};
//!
//! // Create strongly typed IDs
//! let loan_id = LoanId::new();
//! let actor_id = ActorId::new();
//!
//! // Use Result type alias
//! fn example(id: LoanId) -> Result<()> {
//!     Err(DomainError::not_found("Loan", id.to_string()))
//! }
//! assert!(example(loan_id).is_err());
//! ```

pub mod error;
pub mod ids;

// Re-export main types for convenient access
pub use error::{DomainError, Result};
pub use ids::{ActorId, AuditEventId, LoanId, ParseIdError};
