//! Loan entity and storage port.
//!
//! A loan records one device assignment to an employee/SAP-user pair. It is
//! created `ASSIGNED` and transitions exactly once to `RETURNED`; marking
//! the return is the only mutation an existing loan ever receives.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use custodia_core::{ActorId, DomainError, LoanId, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::{LoanStatus, Shift};
use crate::uow::TransactionalStore;

// ============================================================================
// Domain Types
// ============================================================================

/// A tracked device assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier.
    pub id: LoanId,
    /// Document number of the borrowing employee.
    pub employee_document: String,
    /// Employee display name at assignment time. Read-side cache kept by
    /// the persistence collaborator, not authoritative.
    pub employee_name: String,
    /// SAP username the device was assigned under.
    pub sap_username: String,
    /// Code of the assigned device.
    pub device_code: String,
    /// When the device was handed out.
    pub assigned_at: DateTime<Utc>,
    /// Operational shift computed from the assignment time.
    pub shift: Shift,
    /// Lifecycle state.
    pub status: LoanStatus,
    /// Actor who registered the assignment.
    pub registered_by: ActorId,
    /// When the device came back, once returned.
    pub returned_at: Option<DateTime<Utc>>,
    /// Registering actor's username. Read-side cache resolved by the
    /// persistence collaborator, not authoritative.
    pub registered_by_username: Option<String>,
}

/// Input for persisting a new loan. The store assigns the id and opens the
/// loan in `ASSIGNED` state.
#[derive(Debug, Clone)]
pub struct NewLoan {
    /// Document number of the borrowing employee.
    pub employee_document: String,
    /// Denormalized employee display name.
    pub employee_name: String,
    /// SAP username the device is assigned under.
    pub sap_username: String,
    /// Code of the assigned device.
    pub device_code: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Shift computed from the assignment timestamp.
    pub shift: Shift,
    /// Actor registering the assignment.
    pub registered_by: ActorId,
}

/// One exclusivity dimension for open-loan lookups.
///
/// Each dimension is independently exclusive: at most one `ASSIGNED` loan
/// may exist per employee document, per device code, and per SAP username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLoanKey {
    /// Look up by the borrowing employee's document number.
    EmployeeDocument(String),
    /// Look up by the assigned device's code.
    DeviceCode(String),
    /// Look up by the SAP username.
    SapUsername(String),
}

// ============================================================================
// Store Trait
// ============================================================================

/// Port for loan storage.
#[async_trait::async_trait]
pub trait LoanStore: Send + Sync {
    /// Persist a new loan in `ASSIGNED` state.
    async fn create(&self, input: NewLoan) -> Result<Loan>;

    /// Find the open loan for one exclusivity dimension, if any.
    async fn find_open(&self, key: &OpenLoanKey) -> Result<Option<Loan>>;

    /// Transition a loan to `RETURNED`, stamping the return timestamp.
    async fn mark_returned(&self, id: LoanId, returned_at: DateTime<Utc>) -> Result<Loan>;

    /// List loans, optionally filtered by employee document and device
    /// code, most-recent-first by assignment timestamp.
    async fn list(
        &self,
        employee_document: Option<&str>,
        device_code: Option<&str>,
    ) -> Result<Vec<Loan>>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory loan store.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    loans: Arc<RwLock<HashMap<LoanId, Loan>>>,
    saved: Arc<RwLock<Option<HashMap<LoanId, Loan>>>>,
}

impl InMemoryLoanStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the count of loans in the store.
    pub async fn count(&self) -> usize {
        self.loans.read().await.len()
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.loans.write().await.clear();
    }
}

fn matches_key(loan: &Loan, key: &OpenLoanKey) -> bool {
    match key {
        OpenLoanKey::EmployeeDocument(document) => loan.employee_document == *document,
        OpenLoanKey::DeviceCode(code) => loan.device_code == *code,
        OpenLoanKey::SapUsername(username) => loan.sap_username == *username,
    }
}

#[async_trait::async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn create(&self, input: NewLoan) -> Result<Loan> {
        let loan = Loan {
            id: LoanId::new(),
            employee_document: input.employee_document,
            employee_name: input.employee_name,
            sap_username: input.sap_username,
            device_code: input.device_code,
            assigned_at: input.assigned_at,
            shift: input.shift,
            status: LoanStatus::Assigned,
            registered_by: input.registered_by,
            returned_at: None,
            registered_by_username: None,
        };
        self.loans.write().await.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn find_open(&self, key: &OpenLoanKey) -> Result<Option<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans
            .values()
            .find(|l| l.status == LoanStatus::Assigned && matches_key(l, key))
            .cloned())
    }

    async fn mark_returned(&self, id: LoanId, returned_at: DateTime<Utc>) -> Result<Loan> {
        let mut loans = self.loans.write().await;
        let loan = loans
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Loan", id.to_string()))?;
        if loan.status == LoanStatus::Returned {
            return Err(DomainError::rule(format!(
                "loan {id} has already been returned"
            )));
        }
        loan.status = LoanStatus::Returned;
        loan.returned_at = Some(returned_at);
        Ok(loan.clone())
    }

    async fn list(
        &self,
        employee_document: Option<&str>,
        device_code: Option<&str>,
    ) -> Result<Vec<Loan>> {
        let loans = self.loans.read().await;
        let mut results: Vec<_> = loans
            .values()
            .filter(|l| employee_document.is_none_or(|d| l.employee_document == d))
            .filter(|l| device_code.is_none_or(|c| l.device_code == c))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(results)
    }
}

#[async_trait::async_trait]
impl TransactionalStore for InMemoryLoanStore {
    async fn snapshot(&self) {
        *self.saved.write().await = Some(self.loans.read().await.clone());
    }

    async fn restore(&self) {
        if let Some(saved) = self.saved.write().await.take() {
            *self.loans.write().await = saved;
        }
    }

    async fn discard(&self) {
        self.saved.write().await.take();
    }
}
