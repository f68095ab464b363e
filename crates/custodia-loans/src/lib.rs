//! Radio-frequency device loan tracking.
//!
//! This crate provides the core domain logic for tracking loans of physical
//! radio-frequency devices to employees: assigning a device to an
//! employee/SAP-user pair with one-open-loan-per-dimension exclusivity,
//! computing the operational shift from the assignment time, returning
//! devices, and keeping an append-only audit trail of every administrative
//! catalog change.
//!
//! # Features
//!
//! - Employee, device, and SAP user master-data catalogs
//! - Loan lifecycle with per-employee, per-device, and per-SAP-user
//!   exclusivity
//! - Shift classification from the assignment timestamp
//! - Identifier normalization applied before every lookup
//! - Immutable audit events with actor attribution and before/after
//!   snapshots
//! - Unit-of-work scoping so mutations and their audit records commit or
//!   roll back together
//!
//! # Services
//!
//! The [`services`] module provides the business logic:
//! - [`services::LoanService`] - assign and return devices
//! - [`services::CatalogService`] - administer the three catalogs with audit
//! - [`services::AuditQueryService`] - paginate the audit log
//!
//! # Ports
//!
//! Storage is abstracted behind async traits ([`catalog::EmployeeStore`],
//! [`catalog::DeviceStore`], [`catalog::SapUserStore`], [`loan::LoanStore`],
//! [`audit::AuditStore`], [`audit::AuditQueryStore`]) plus [`uow::UnitOfWork`]
//! and [`clock::Clock`]. In-memory implementations of every port ship in
//! this crate for tests and storage-free embeddings; durable adapters live
//! with the persistence collaborator.

pub mod audit;
pub mod catalog;
pub mod clock;
pub mod loan;
pub mod rules;
pub mod services;
pub mod types;
pub mod uow;

// Re-export commonly used types
pub use audit::{
    AdminChangeEvent,
    AdminChangeEventInput,
    AuditLogRecord,
    AuditQueryStore,
    AuditStore,
    InMemoryAuditStore,
};
pub use catalog::{
    CreateDeviceInput,
    CreateEmployeeInput,
    CreateSapUserInput,
    Device,
    DeviceStore,
    Employee,
    EmployeeStore,
    InMemoryDeviceStore,
    InMemoryEmployeeStore,
    InMemorySapUserStore,
    SapUser,
    SapUserStore,
    UpdateDeviceInput,
    UpdateEmployeeInput,
    UpdateSapUserInput,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use loan::{InMemoryLoanStore, Loan, LoanStore, NewLoan, OpenLoanKey};
pub use rules::{clean_device_code, clean_document, clean_sap_username, compute_shift};
pub use services::{AuditQueryService, CatalogService, LoanService, ReturnRequest};
pub use types::{CatalogAggregate, ChangeAction, LoanStatus, Shift};
pub use uow::{InMemoryUnitOfWork, NullUnitOfWork, TransactionalStore, UnitOfWork};
