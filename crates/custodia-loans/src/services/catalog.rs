//! Catalog service administering the three master-data catalogs.
//!
//! Every create/update/delete runs inside the injected unit of work and
//! appends exactly one audit event in that same scope, so the mutation and
//! its audit record commit or roll back together. Event timestamps come
//! from the injected clock, never from ambient system time.

use std::sync::Arc;

use custodia_core::{ActorId, DomainError, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::audit::{AdminChangeEventInput, AuditStore};
use crate::catalog::{
    CreateDeviceInput, CreateEmployeeInput, CreateSapUserInput, Device, DeviceStore, Employee,
    EmployeeStore, SapUser, SapUserStore, UpdateDeviceInput, UpdateEmployeeInput,
    UpdateSapUserInput,
};
use crate::clock::Clock;
use crate::types::{CatalogAggregate, ChangeAction};
use crate::uow::UnitOfWork;

fn employee_snapshot(employee: &Employee) -> serde_json::Value {
    json!({ "name": employee.name, "active": employee.active })
}

fn device_snapshot(device: &Device) -> serde_json::Value {
    json!({ "description": device.description, "active": device.active })
}

fn sap_user_snapshot(user: &SapUser) -> serde_json::Value {
    json!({ "employee_document": user.employee_document, "active": user.active })
}

/// Service administering employees, devices, and SAP users with a
/// consistent audit trail.
pub struct CatalogService {
    employees: Arc<dyn EmployeeStore>,
    devices: Arc<dyn DeviceStore>,
    sap_users: Arc<dyn SapUserStore>,
    audit: Arc<dyn AuditStore>,
    uow: Arc<dyn UnitOfWork>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        devices: Arc<dyn DeviceStore>,
        sap_users: Arc<dyn SapUserStore>,
        audit: Arc<dyn AuditStore>,
        uow: Arc<dyn UnitOfWork>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            employees,
            devices,
            sap_users,
            audit,
            uow,
            clock,
        }
    }

    async fn append_event(
        &self,
        aggregate: CatalogAggregate,
        action: ChangeAction,
        key: String,
        actor: ActorId,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
        reason: Option<String>,
    ) -> Result<()> {
        self.audit
            .append(AdminChangeEventInput {
                aggregate,
                action,
                key,
                at: self.clock.now(),
                actor,
                before,
                after,
                reason,
            })
            .await?;
        Ok(())
    }

    async fn release<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => match self.uow.commit().await {
                Ok(()) => Ok(value),
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

    // ------------------------------------------------------------------
    // Employee
    // ------------------------------------------------------------------

    /// Create an employee, rejecting duplicate document numbers.
    pub async fn create_employee(
        &self,
        input: CreateEmployeeInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Employee> {
        self.uow.begin().await?;
        let result = self.create_employee_in_tx(input, actor, reason).await;
        self.release(result).await
    }

    async fn create_employee_in_tx(
        &self,
        input: CreateEmployeeInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Employee> {
        if self.employees.get(&input.document).await?.is_some() {
            return Err(DomainError::rule(format!(
                "an employee with document {} already exists",
                input.document
            )));
        }

        let created = self.employees.create(input).await?;
        self.append_event(
            CatalogAggregate::Employee,
            ChangeAction::Created,
            created.document.clone(),
            actor,
            None,
            Some(employee_snapshot(&created)),
            reason,
        )
        .await?;

        info!(document = %created.document, "employee created");
        Ok(created)
    }

    /// Update an employee, auditing the before/after field snapshots.
    pub async fn update_employee(
        &self,
        document: &str,
        input: UpdateEmployeeInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Employee> {
        self.uow.begin().await?;
        let result = self
            .update_employee_in_tx(document, input, actor, reason)
            .await;
        self.release(result).await
    }

    async fn update_employee_in_tx(
        &self,
        document: &str,
        input: UpdateEmployeeInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Employee> {
        let before = self
            .employees
            .get(document)
            .await?
            .ok_or_else(|| DomainError::not_found("Employee", document))?;

        let updated = self.employees.update(document, input).await?;
        self.append_event(
            CatalogAggregate::Employee,
            ChangeAction::Updated,
            document.to_string(),
            actor,
            Some(employee_snapshot(&before)),
            Some(employee_snapshot(&updated)),
            reason,
        )
        .await?;

        info!(document = %document, "employee updated");
        Ok(updated)
    }

    /// Delete an employee, auditing the pre-delete snapshot.
    pub async fn delete_employee(
        &self,
        document: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        self.uow.begin().await?;
        let result = self.delete_employee_in_tx(document, actor, reason).await;
        self.release(result).await
    }

    async fn delete_employee_in_tx(
        &self,
        document: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        let before = self
            .employees
            .get(document)
            .await?
            .ok_or_else(|| DomainError::not_found("Employee", document))?;

        self.employees.delete(document).await?;
        self.append_event(
            CatalogAggregate::Employee,
            ChangeAction::Deleted,
            document.to_string(),
            actor,
            Some(employee_snapshot(&before)),
            None,
            reason,
        )
        .await?;

        info!(document = %document, "employee deleted");
        Ok(())
    }

    /// Get an employee by document number.
    pub async fn get_employee(&self, document: &str) -> Result<Employee> {
        self.employees
            .get(document)
            .await?
            .ok_or_else(|| DomainError::not_found("Employee", document))
    }

    /// List employees, optionally filtered by a substring of document or
    /// name. An empty filter means no filter.
    pub async fn list_employees(&self, text_filter: Option<&str>) -> Result<Vec<Employee>> {
        let filter = text_filter.filter(|f| !f.is_empty());
        self.employees.list(filter).await
    }

    // ------------------------------------------------------------------
    // Device
    // ------------------------------------------------------------------

    /// Create a device, rejecting duplicate codes.
    pub async fn create_device(
        &self,
        input: CreateDeviceInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Device> {
        self.uow.begin().await?;
        let result = self.create_device_in_tx(input, actor, reason).await;
        self.release(result).await
    }

    async fn create_device_in_tx(
        &self,
        input: CreateDeviceInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Device> {
        if self.devices.get(&input.code).await?.is_some() {
            return Err(DomainError::rule(format!(
                "a device with code {} already exists",
                input.code
            )));
        }

        let created = self.devices.create(input).await?;
        self.append_event(
            CatalogAggregate::Device,
            ChangeAction::Created,
            created.code.clone(),
            actor,
            None,
            Some(device_snapshot(&created)),
            reason,
        )
        .await?;

        info!(code = %created.code, "device created");
        Ok(created)
    }

    /// Update a device, auditing the before/after field snapshots.
    pub async fn update_device(
        &self,
        code: &str,
        input: UpdateDeviceInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Device> {
        self.uow.begin().await?;
        let result = self.update_device_in_tx(code, input, actor, reason).await;
        self.release(result).await
    }

    async fn update_device_in_tx(
        &self,
        code: &str,
        input: UpdateDeviceInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<Device> {
        let before = self
            .devices
            .get(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", code))?;

        let updated = self.devices.update(code, input).await?;
        self.append_event(
            CatalogAggregate::Device,
            ChangeAction::Updated,
            code.to_string(),
            actor,
            Some(device_snapshot(&before)),
            Some(device_snapshot(&updated)),
            reason,
        )
        .await?;

        info!(code = %code, "device updated");
        Ok(updated)
    }

    /// Delete a device, auditing the pre-delete snapshot.
    pub async fn delete_device(
        &self,
        code: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        self.uow.begin().await?;
        let result = self.delete_device_in_tx(code, actor, reason).await;
        self.release(result).await
    }

    async fn delete_device_in_tx(
        &self,
        code: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        let before = self
            .devices
            .get(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", code))?;

        self.devices.delete(code).await?;
        self.append_event(
            CatalogAggregate::Device,
            ChangeAction::Deleted,
            code.to_string(),
            actor,
            Some(device_snapshot(&before)),
            None,
            reason,
        )
        .await?;

        info!(code = %code, "device deleted");
        Ok(())
    }

    /// Get a device by code.
    pub async fn get_device(&self, code: &str) -> Result<Device> {
        self.devices
            .get(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Device", code))
    }

    /// List devices, optionally filtered by a substring of code or
    /// description. An empty filter means no filter.
    pub async fn list_devices(&self, text_filter: Option<&str>) -> Result<Vec<Device>> {
        let filter = text_filter.filter(|f| !f.is_empty());
        self.devices.list(filter).await
    }

    // ------------------------------------------------------------------
    // SapUser
    // ------------------------------------------------------------------

    /// Create a SAP user, rejecting duplicate usernames.
    pub async fn create_sap_user(
        &self,
        input: CreateSapUserInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<SapUser> {
        self.uow.begin().await?;
        let result = self.create_sap_user_in_tx(input, actor, reason).await;
        self.release(result).await
    }

    async fn create_sap_user_in_tx(
        &self,
        input: CreateSapUserInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<SapUser> {
        if self.sap_users.get(&input.username).await?.is_some() {
            return Err(DomainError::rule(format!(
                "a SAP user {} already exists",
                input.username
            )));
        }

        let created = self.sap_users.create(input).await?;
        self.append_event(
            CatalogAggregate::SapUser,
            ChangeAction::Created,
            created.username.clone(),
            actor,
            None,
            Some(sap_user_snapshot(&created)),
            reason,
        )
        .await?;

        info!(username = %created.username, "SAP user created");
        Ok(created)
    }

    /// Update a SAP user, auditing the before/after field snapshots.
    pub async fn update_sap_user(
        &self,
        username: &str,
        input: UpdateSapUserInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<SapUser> {
        self.uow.begin().await?;
        let result = self
            .update_sap_user_in_tx(username, input, actor, reason)
            .await;
        self.release(result).await
    }

    async fn update_sap_user_in_tx(
        &self,
        username: &str,
        input: UpdateSapUserInput,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<SapUser> {
        let before = self
            .sap_users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found("SapUser", username))?;

        let updated = self.sap_users.update(username, input).await?;
        self.append_event(
            CatalogAggregate::SapUser,
            ChangeAction::Updated,
            username.to_string(),
            actor,
            Some(sap_user_snapshot(&before)),
            Some(sap_user_snapshot(&updated)),
            reason,
        )
        .await?;

        info!(username = %username, "SAP user updated");
        Ok(updated)
    }

    /// Delete a SAP user, auditing the pre-delete snapshot.
    pub async fn delete_sap_user(
        &self,
        username: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        self.uow.begin().await?;
        let result = self.delete_sap_user_in_tx(username, actor, reason).await;
        self.release(result).await
    }

    async fn delete_sap_user_in_tx(
        &self,
        username: &str,
        actor: ActorId,
        reason: Option<String>,
    ) -> Result<()> {
        let before = self
            .sap_users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found("SapUser", username))?;

        self.sap_users.delete(username).await?;
        self.append_event(
            CatalogAggregate::SapUser,
            ChangeAction::Deleted,
            username.to_string(),
            actor,
            Some(sap_user_snapshot(&before)),
            None,
            reason,
        )
        .await?;

        info!(username = %username, "SAP user deleted");
        Ok(())
    }

    /// Get a SAP user by username.
    pub async fn get_sap_user(&self, username: &str) -> Result<SapUser> {
        self.sap_users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found("SapUser", username))
    }

    /// List SAP users, optionally filtered by a substring of username or
    /// linked document. An empty filter means no filter.
    pub async fn list_sap_users(&self, text_filter: Option<&str>) -> Result<Vec<SapUser>> {
        let filter = text_filter.filter(|f| !f.is_empty());
        self.sap_users.list(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditStore;
    use crate::catalog::{InMemoryDeviceStore, InMemoryEmployeeStore, InMemorySapUserStore};
    use crate::clock::FixedClock;
    use crate::uow::NullUnitOfWork;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    struct Fixture {
        service: CatalogService,
        audit: Arc<InMemoryAuditStore>,
        clock: Arc<FixedClock>,
    }

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let employees = Arc::new(InMemoryEmployeeStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let sap_users = Arc::new(InMemorySapUserStore::new(employees.clone()));
        let audit = Arc::new(InMemoryAuditStore::new());
        let clock = Arc::new(FixedClock::new(fixed_instant()));
        let service = CatalogService::new(
            employees,
            devices,
            sap_users,
            audit.clone(),
            Arc::new(NullUnitOfWork::new()),
            clock.clone(),
        );
        Fixture {
            service,
            audit,
            clock,
        }
    }

    fn employee_input() -> CreateEmployeeInput {
        CreateEmployeeInput {
            document: "1234567890".to_string(),
            name: "Ana Perez".to_string(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_create_employee_appends_created_event() {
        let f = fixture();
        let actor = ActorId::new();

        let created = f
            .service
            .create_employee(employee_input(), actor, Some("onboarding".to_string()))
            .await
            .unwrap();
        assert_eq!(created.document, "1234567890");

        let events = f.audit.get_all().await;
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.aggregate, CatalogAggregate::Employee);
        assert_eq!(event.action, ChangeAction::Created);
        assert_eq!(event.key, "1234567890");
        assert_eq!(event.at, fixed_instant());
        assert_eq!(event.actor, actor);
        assert_eq!(event.before, None);
        assert_eq!(
            event.after,
            Some(json!({"name": "Ana Perez", "active": true}))
        );
        assert_eq!(event.reason.as_deref(), Some("onboarding"));
    }

    #[tokio::test]
    async fn test_duplicate_employee_appends_no_event() {
        let f = fixture();
        let actor = ActorId::new();
        f.service
            .create_employee(employee_input(), actor, None)
            .await
            .unwrap();

        let result = f.service.create_employee(employee_input(), actor, None).await;
        assert!(matches!(
            result,
            Err(DomainError::BusinessRuleViolation { .. })
        ));
        assert_eq!(f.audit.count().await, 1); // Only the first create
    }

    #[tokio::test]
    async fn test_update_employee_audits_before_and_after() {
        let f = fixture();
        let actor = ActorId::new();
        f.service
            .create_employee(employee_input(), actor, None)
            .await
            .unwrap();

        let later = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        f.clock.set(later);

        let updated = f
            .service
            .update_employee(
                "1234567890",
                UpdateEmployeeInput {
                    active: Some(false),
                    ..Default::default()
                },
                actor,
                None,
            )
            .await
            .unwrap();
        assert!(!updated.active);

        let events = f.audit.get_all().await;
        assert_eq!(events.len(), 2);
        let event = &events[1];
        assert_eq!(event.action, ChangeAction::Updated);
        assert_eq!(event.at, later);
        assert_eq!(
            event.before,
            Some(json!({"name": "Ana Perez", "active": true}))
        );
        assert_eq!(
            event.after,
            Some(json!({"name": "Ana Perez", "active": false}))
        );
    }

    #[tokio::test]
    async fn test_update_missing_employee_is_not_found() {
        let f = fixture();
        let result = f
            .service
            .update_employee(
                "999",
                UpdateEmployeeInput::default(),
                ActorId::new(),
                None,
            )
            .await;
        assert!(matches!(result, Err(DomainError::EntityNotFound { .. })));
        assert_eq!(f.audit.count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_employee_audits_snapshot() {
        let f = fixture();
        let actor = ActorId::new();
        f.service
            .create_employee(employee_input(), actor, None)
            .await
            .unwrap();

        f.service
            .delete_employee("1234567890", actor, Some("left the company".to_string()))
            .await
            .unwrap();

        let events = f.audit.get_all().await;
        assert_eq!(events.len(), 2);
        let event = &events[1];
        assert_eq!(event.action, ChangeAction::Deleted);
        assert_eq!(
            event.before,
            Some(json!({"name": "Ana Perez", "active": true}))
        );
        assert_eq!(event.after, None);

        let gone = f.service.get_employee("1234567890").await;
        assert!(matches!(gone, Err(DomainError::EntityNotFound { .. })));
    }

    #[tokio::test]
    async fn test_device_lifecycle_audits_description_changes() {
        let f = fixture();
        let actor = ActorId::new();

        f.service
            .create_device(
                CreateDeviceInput {
                    code: "RF-001".to_string(),
                    description: Some("warehouse handset".to_string()),
                    active: true,
                },
                actor,
                None,
            )
            .await
            .unwrap();

        f.service
            .update_device(
                "RF-001",
                UpdateDeviceInput {
                    description: Some(None),
                    ..Default::default()
                },
                actor,
                None,
            )
            .await
            .unwrap();

        let events = f.audit.get_all().await;
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].after,
            Some(json!({"description": "warehouse handset", "active": true}))
        );
        assert_eq!(
            events[1].after,
            Some(json!({"description": null, "active": true}))
        );
    }

    #[tokio::test]
    async fn test_duplicate_device_code_is_rejected() {
        let f = fixture();
        let actor = ActorId::new();
        let input = CreateDeviceInput {
            code: "RF-001".to_string(),
            description: None,
            active: true,
        };

        f.service.create_device(input.clone(), actor, None).await.unwrap();
        let result = f.service.create_device(input, actor, None).await;
        assert!(matches!(
            result,
            Err(DomainError::BusinessRuleViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_sap_user_lifecycle_audits_link_changes() {
        let f = fixture();
        let actor = ActorId::new();
        f.service
            .create_employee(employee_input(), actor, None)
            .await
            .unwrap();

        f.service
            .create_sap_user(
                CreateSapUserInput {
                    username: "sap-user".to_string(),
                    employee_document: None,
                    active: true,
                },
                actor,
                None,
            )
            .await
            .unwrap();

        f.service
            .update_sap_user(
                "sap-user",
                UpdateSapUserInput {
                    employee_document: Some(Some("1234567890".to_string())),
                    ..Default::default()
                },
                actor,
                None,
            )
            .await
            .unwrap();

        let events = f.audit.get_all().await;
        assert_eq!(events.len(), 3); // employee create + user create + user update
        let update = &events[2];
        assert_eq!(update.aggregate, CatalogAggregate::SapUser);
        assert_eq!(
            update.before,
            Some(json!({"employee_document": null, "active": true}))
        );
        assert_eq!(
            update.after,
            Some(json!({"employee_document": "1234567890", "active": true}))
        );
    }

    #[tokio::test]
    async fn test_delete_missing_sap_user_is_not_found() {
        let f = fixture();
        let result = f
            .service
            .delete_sap_user("ghost", ActorId::new(), None)
            .await;
        assert!(matches!(result, Err(DomainError::EntityNotFound { .. })));
        assert_eq!(f.audit.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_treats_empty_filter_as_no_filter() {
        let f = fixture();
        let actor = ActorId::new();
        f.service
            .create_employee(employee_input(), actor, None)
            .await
            .unwrap();

        let all = f.service.list_employees(Some("")).await.unwrap();
        assert_eq!(all.len(), 1);

        let none = f.service.list_employees(Some("zzz")).await.unwrap();
        assert!(none.is_empty());
    }
}
