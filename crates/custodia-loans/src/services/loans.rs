//! Loan service orchestrating device assignment and return.
//!
//! All mutating operations run inside the injected unit of work: committed
//! on success, rolled back on any domain error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use custodia_core::{ActorId, DomainError, Result};
use tracing::{info, warn};

use crate::catalog::{DeviceStore, EmployeeStore, SapUserStore};
use crate::loan::{Loan, LoanStore, NewLoan, OpenLoanKey};
use crate::rules::{clean_device_code, clean_document, clean_sap_username, compute_shift};
use crate::uow::UnitOfWork;

/// Request for returning a device by exactly one identifier.
///
/// Exactly one of the three fields must survive normalization; supplying
/// zero or more than one is a business rule violation.
#[derive(Debug, Clone, Default)]
pub struct ReturnRequest {
    /// Return by the borrowing employee's document number.
    pub employee_document: Option<String>,
    /// Return by the assigned device's code.
    pub device_code: Option<String>,
    /// Return by the SAP username.
    pub sap_username: Option<String>,
}

/// Service orchestrating the loan lifecycle.
pub struct LoanService {
    employees: Arc<dyn EmployeeStore>,
    devices: Arc<dyn DeviceStore>,
    sap_users: Arc<dyn SapUserStore>,
    loans: Arc<dyn LoanStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl LoanService {
    /// Create a new loan service.
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        devices: Arc<dyn DeviceStore>,
        sap_users: Arc<dyn SapUserStore>,
        loans: Arc<dyn LoanStore>,
        uow: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            employees,
            devices,
            sap_users,
            loans,
            uow,
        }
    }

    /// Assign a device to an employee/SAP-user pair.
    ///
    /// Validates that all three entities exist and are active, that none of
    /// the three exclusivity dimensions already has an open loan, computes
    /// the shift from `now`, and persists the new loan in `ASSIGNED` state.
    pub async fn assign(
        &self,
        employee_document: &str,
        device_code: &str,
        sap_username: &str,
        registered_by: ActorId,
        now: DateTime<Utc>,
    ) -> Result<Loan> {
        let document = clean_document(Some(employee_document))
            .ok_or_else(|| DomainError::rule("invalid employee document"))?;
        let code = clean_device_code(Some(device_code))
            .ok_or_else(|| DomainError::rule("invalid device code"))?;
        let username = clean_sap_username(Some(sap_username))
            .ok_or_else(|| DomainError::rule("invalid SAP username"))?;

        self.uow.begin().await?;
        let result = self
            .assign_in_tx(&document, &code, &username, registered_by, now)
            .await;
        self.release(result).await
    }

    async fn assign_in_tx(
        &self,
        document: &str,
        code: &str,
        username: &str,
        registered_by: ActorId,
        now: DateTime<Utc>,
    ) -> Result<Loan> {
        let employee = self
            .employees
            .get(document)
            .await?
            .ok_or_else(|| DomainError::not_found("Employee", document))?;
        if !employee.active {
            return Err(DomainError::inactive("Employee", document));
        }

        let device = self
            .devices
            .get(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", code))?;
        if !device.active {
            return Err(DomainError::inactive("Device", code));
        }

        let sap_user = self
            .sap_users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found("SapUser", username))?;
        if !sap_user.active {
            return Err(DomainError::inactive("SapUser", username));
        }

        // One open loan per dimension; the check order decides which
        // conflict a dual-violation request reports.
        if self
            .loans
            .find_open(&OpenLoanKey::EmployeeDocument(document.to_string()))
            .await?
            .is_some()
        {
            return Err(DomainError::rule(format!(
                "employee {document} already has an open loan"
            )));
        }
        if self
            .loans
            .find_open(&OpenLoanKey::SapUsername(username.to_string()))
            .await?
            .is_some()
        {
            return Err(DomainError::rule(format!(
                "SAP user {username} already has an open loan"
            )));
        }
        if self
            .loans
            .find_open(&OpenLoanKey::DeviceCode(code.to_string()))
            .await?
            .is_some()
        {
            return Err(DomainError::rule(format!(
                "device {code} is already assigned"
            )));
        }

        let shift = compute_shift(Some(now))?;

        let loan = self
            .loans
            .create(NewLoan {
                employee_document: employee.document,
                employee_name: employee.name,
                sap_username: sap_user.username,
                device_code: device.code,
                assigned_at: now,
                shift,
                registered_by,
            })
            .await?;

        info!(
            loan = %loan.id,
            device = %loan.device_code,
            employee = %loan.employee_document,
            shift = %loan.shift,
            "device assigned"
        );
        Ok(loan)
    }

    /// Return a device identified by exactly one dimension.
    ///
    /// Closes the matching open loan, stamping `now` as the return
    /// timestamp. This is the only mutation path for an existing loan.
    pub async fn return_device(&self, request: ReturnRequest, now: DateTime<Utc>) -> Result<Loan> {
        let code = clean_device_code(request.device_code.as_deref());
        let document = clean_document(request.employee_document.as_deref());
        let username = clean_sap_username(request.sap_username.as_deref());

        let provided = [code.is_some(), document.is_some(), username.is_some()]
            .iter()
            .filter(|p| **p)
            .count();
        if provided != 1 {
            return Err(DomainError::rule(
                "exactly one of device_code, employee_document or sap_username must be provided",
            ));
        }

        let (key, target) = if let Some(code) = code {
            (OpenLoanKey::DeviceCode(code.clone()), format!("device {code}"))
        } else if let Some(document) = document {
            (
                OpenLoanKey::EmployeeDocument(document.clone()),
                format!("employee {document}"),
            )
        } else {
            // provided == 1 and the other two are absent
            let username = username.unwrap_or_default();
            (
                OpenLoanKey::SapUsername(username.clone()),
                format!("SAP user {username}"),
            )
        };

        self.uow.begin().await?;
        let result = self.return_in_tx(&key, &target, now).await;
        self.release(result).await
    }

    async fn return_in_tx(
        &self,
        key: &OpenLoanKey,
        target: &str,
        now: DateTime<Utc>,
    ) -> Result<Loan> {
        let open = self
            .loans
            .find_open(key)
            .await?
            .ok_or_else(|| DomainError::not_found("Loan", target))?;

        let returned = self.loans.mark_returned(open.id, now).await?;
        info!(
            loan = %returned.id,
            device = %returned.device_code,
            "device returned"
        );
        Ok(returned)
    }

    /// Return by device code.
    pub async fn return_by_device(&self, device_code: &str, now: DateTime<Utc>) -> Result<Loan> {
        self.return_device(
            ReturnRequest {
                device_code: Some(device_code.to_string()),
                ..Default::default()
            },
            now,
        )
        .await
    }

    /// Return by employee document.
    pub async fn return_by_employee(
        &self,
        employee_document: &str,
        now: DateTime<Utc>,
    ) -> Result<Loan> {
        self.return_device(
            ReturnRequest {
                employee_document: Some(employee_document.to_string()),
                ..Default::default()
            },
            now,
        )
        .await
    }

    /// Return by SAP username.
    pub async fn return_by_sap_user(&self, sap_username: &str, now: DateTime<Utc>) -> Result<Loan> {
        self.return_device(
            ReturnRequest {
                sap_username: Some(sap_username.to_string()),
                ..Default::default()
            },
            now,
        )
        .await
    }

    /// List loans, optionally filtered, most-recent-first.
    ///
    /// Pure read: no unit of work, no invariants. Filters are normalized
    /// first; a filter that normalizes to empty is treated as absent.
    pub async fn list(
        &self,
        employee_document: Option<&str>,
        device_code: Option<&str>,
    ) -> Result<Vec<Loan>> {
        let document = clean_document(employee_document);
        let code = clean_device_code(device_code);
        self.loans.list(document.as_deref(), code.as_deref()).await
    }

    async fn release(&self, result: Result<Loan>) -> Result<Loan> {
        match result {
            Ok(loan) => match self.uow.commit().await {
                Ok(()) => Ok(loan),
                Err(commit_err) => {
                    if let Err(rollback_err) = self.uow.rollback().await {
                        warn!(error = %rollback_err, "rollback failed after commit error");
                    }
                    Err(commit_err)
                }
            },
            Err(err) => {
                if let Err(rollback_err) = self.uow.rollback().await {
                    warn!(
                        error = %rollback_err,
                        kind = err.kind(),
                        "rollback failed after domain error"
                    );
                }
                Err(err)
            }
        }
    }
}
