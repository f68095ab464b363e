//! Application services for the loan domain.
//!
//! - [`LoanService`] - device assignment and return
//! - [`CatalogService`] - master-data administration with audit
//! - [`AuditQueryService`] - read-side audit pagination

mod audit_query;
mod catalog;
mod loans;

pub use audit_query::{AuditQueryService, DEFAULT_LIMIT, MAX_LIMIT};
pub use catalog::CatalogService;
pub use loans::{LoanService, ReturnRequest};
