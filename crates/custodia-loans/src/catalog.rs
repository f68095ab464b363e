//! Master-data catalogs: employees, devices, and SAP users.
//!
//! This module provides the catalog entities, their create/update input
//! types, the store ports the services depend on, and in-memory store
//! implementations used by the test suite and by embeddings without durable
//! storage.

use std::collections::HashMap;
use std::sync::Arc;

use custodia_core::{DomainError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::uow::TransactionalStore;

// ============================================================================
// Domain Types
// ============================================================================

/// An employee who may hold device loans.
///
/// Identified by document number; loans and SAP users reference it by that
/// value, not by ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Business key: document number, digits only, at most 15 chars.
    pub document: String,
    /// Display name.
    pub name: String,
    /// Whether the employee may receive new loans.
    pub active: bool,
}

/// A radio-frequency device available for loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Business key: device code, uppercase, at most 25 chars.
    pub code: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Whether the device may be assigned.
    pub active: bool,
}

/// A SAP account that participates in loans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SapUser {
    /// Business key: username, trimmed, at most 50 chars.
    pub username: String,
    /// Optional link to an employee's document number. Validated at write
    /// time: it must point to an existing employee or be absent.
    pub employee_document: Option<String>,
    /// Whether the account may participate in loans.
    pub active: bool,
}

/// Input for creating an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeInput {
    /// Document number.
    pub document: String,
    /// Display name.
    pub name: String,
    /// Active flag.
    pub active: bool,
}

/// Changeset for an employee. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEmployeeInput {
    /// New display name.
    pub name: Option<String>,
    /// New active flag.
    pub active: Option<bool>,
}

/// Input for creating a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeviceInput {
    /// Device code.
    pub code: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Active flag.
    pub active: bool,
}

/// Changeset for a device. Outer `None` leaves the field unchanged; for the
/// description, an inner `None` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateDeviceInput {
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New active flag.
    pub active: Option<bool>,
}

/// Input for creating a SAP user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSapUserInput {
    /// Username.
    pub username: String,
    /// Optional link to an employee document.
    pub employee_document: Option<String>,
    /// Active flag.
    pub active: bool,
}

/// Changeset for a SAP user. Outer `None` leaves the field unchanged; for
/// the employee link, an inner `None` unlinks it.
#[derive(Debug, Clone, Default)]
pub struct UpdateSapUserInput {
    /// New employee link (`Some(None)` unlinks).
    pub employee_document: Option<Option<String>>,
    /// New active flag.
    pub active: Option<bool>,
}

// ============================================================================
// Store Traits
// ============================================================================

/// Port for employee catalog storage.
#[async_trait::async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Get an employee by document number.
    async fn get(&self, document: &str) -> Result<Option<Employee>>;

    /// Create a new employee.
    async fn create(&self, input: CreateEmployeeInput) -> Result<Employee>;

    /// Apply a changeset to an existing employee.
    async fn update(&self, document: &str, input: UpdateEmployeeInput) -> Result<Employee>;

    /// Delete an employee.
    async fn delete(&self, document: &str) -> Result<()>;

    /// List employees, optionally filtered by a case-insensitive substring
    /// of document or name, ordered by document ascending.
    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<Employee>>;
}

/// Port for device catalog storage.
#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync {
    /// Get a device by code.
    async fn get(&self, code: &str) -> Result<Option<Device>>;

    /// Create a new device.
    async fn create(&self, input: CreateDeviceInput) -> Result<Device>;

    /// Apply a changeset to an existing device.
    async fn update(&self, code: &str, input: UpdateDeviceInput) -> Result<Device>;

    /// Delete a device.
    async fn delete(&self, code: &str) -> Result<()>;

    /// List devices, optionally filtered by a case-insensitive substring of
    /// code or description, ordered by code ascending.
    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<Device>>;
}

/// Port for SAP user catalog storage.
#[async_trait::async_trait]
pub trait SapUserStore: Send + Sync {
    /// Get a SAP user by username.
    async fn get(&self, username: &str) -> Result<Option<SapUser>>;

    /// Create a new SAP user.
    async fn create(&self, input: CreateSapUserInput) -> Result<SapUser>;

    /// Apply a changeset to an existing SAP user.
    async fn update(&self, username: &str, input: UpdateSapUserInput) -> Result<SapUser>;

    /// Delete a SAP user.
    async fn delete(&self, username: &str) -> Result<()>;

    /// List SAP users, optionally filtered by a case-insensitive substring
    /// of username or linked document, ordered by username ascending.
    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<SapUser>>;
}

// ============================================================================
// In-Memory Stores
// ============================================================================

fn matches_filter(haystacks: &[Option<&str>], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .flatten()
        .any(|h| h.to_lowercase().contains(&needle))
}

/// In-memory employee store.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    entries: Arc<RwLock<HashMap<String, Employee>>>,
    saved: Arc<RwLock<Option<HashMap<String, Employee>>>>,
}

impl InMemoryEmployeeStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an employee with the given document exists. Used by the SAP
    /// user store to validate the employee link.
    pub async fn contains(&self, document: &str) -> bool {
        self.entries.read().await.contains_key(document)
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait::async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn get(&self, document: &str) -> Result<Option<Employee>> {
        Ok(self.entries.read().await.get(document).cloned())
    }

    async fn create(&self, input: CreateEmployeeInput) -> Result<Employee> {
        let employee = Employee {
            document: input.document,
            name: input.name,
            active: input.active,
        };
        self.entries
            .write()
            .await
            .insert(employee.document.clone(), employee.clone());
        Ok(employee)
    }

    async fn update(&self, document: &str, input: UpdateEmployeeInput) -> Result<Employee> {
        let mut entries = self.entries.write().await;
        let employee = entries
            .get_mut(document)
            .ok_or_else(|| DomainError::not_found("Employee", document))?;

        if let Some(name) = input.name {
            employee.name = name;
        }
        if let Some(active) = input.active {
            employee.active = active;
        }
        Ok(employee.clone())
    }

    async fn delete(&self, document: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(document)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Employee", document))
    }

    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<Employee>> {
        let entries = self.entries.read().await;
        let mut results: Vec<_> = entries
            .values()
            .filter(|e| {
                text_filter.is_none_or(|f| {
                    matches_filter(&[Some(e.document.as_str()), Some(e.name.as_str())], f)
                })
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| a.document.cmp(&b.document));
        Ok(results)
    }
}

#[async_trait::async_trait]
impl TransactionalStore for InMemoryEmployeeStore {
    async fn snapshot(&self) {
        *self.saved.write().await = Some(self.entries.read().await.clone());
    }

    async fn restore(&self) {
        if let Some(saved) = self.saved.write().await.take() {
            *self.entries.write().await = saved;
        }
    }

    async fn discard(&self) {
        self.saved.write().await.take();
    }
}

/// In-memory device store.
#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    entries: Arc<RwLock<HashMap<String, Device>>>,
    saved: Arc<RwLock<Option<HashMap<String, Device>>>>,
}

impl InMemoryDeviceStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn get(&self, code: &str) -> Result<Option<Device>> {
        Ok(self.entries.read().await.get(code).cloned())
    }

    async fn create(&self, input: CreateDeviceInput) -> Result<Device> {
        let device = Device {
            code: input.code,
            description: input.description,
            active: input.active,
        };
        self.entries
            .write()
            .await
            .insert(device.code.clone(), device.clone());
        Ok(device)
    }

    async fn update(&self, code: &str, input: UpdateDeviceInput) -> Result<Device> {
        let mut entries = self.entries.write().await;
        let device = entries
            .get_mut(code)
            .ok_or_else(|| DomainError::not_found("Device", code))?;

        if let Some(description) = input.description {
            device.description = description;
        }
        if let Some(active) = input.active {
            device.active = active;
        }
        Ok(device.clone())
    }

    async fn delete(&self, code: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Device", code))
    }

    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<Device>> {
        let entries = self.entries.read().await;
        let mut results: Vec<_> = entries
            .values()
            .filter(|d| {
                text_filter.is_none_or(|f| {
                    matches_filter(&[Some(d.code.as_str()), d.description.as_deref()], f)
                })
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(results)
    }
}

#[async_trait::async_trait]
impl TransactionalStore for InMemoryDeviceStore {
    async fn snapshot(&self) {
        *self.saved.write().await = Some(self.entries.read().await.clone());
    }

    async fn restore(&self) {
        if let Some(saved) = self.saved.write().await.take() {
            *self.entries.write().await = saved;
        }
    }

    async fn discard(&self) {
        self.saved.write().await.take();
    }
}

/// In-memory SAP user store.
///
/// Enforces the employee-link referential check itself, since it stands in
/// for the persistence collaborator that would otherwise do so.
#[derive(Debug)]
pub struct InMemorySapUserStore {
    entries: Arc<RwLock<HashMap<String, SapUser>>>,
    saved: Arc<RwLock<Option<HashMap<String, SapUser>>>>,
    employees: Arc<InMemoryEmployeeStore>,
}

impl InMemorySapUserStore {
    /// Create a new in-memory store validating links against `employees`.
    #[must_use]
    pub fn new(employees: Arc<InMemoryEmployeeStore>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            saved: Arc::new(RwLock::new(None)),
            employees,
        }
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn check_link(&self, document: &str) -> Result<()> {
        if self.employees.contains(document).await {
            Ok(())
        } else {
            Err(DomainError::rule(format!(
                "SAP user link refers to unknown employee {document}"
            )))
        }
    }
}

#[async_trait::async_trait]
impl SapUserStore for InMemorySapUserStore {
    async fn get(&self, username: &str) -> Result<Option<SapUser>> {
        Ok(self.entries.read().await.get(username).cloned())
    }

    async fn create(&self, input: CreateSapUserInput) -> Result<SapUser> {
        if let Some(ref document) = input.employee_document {
            self.check_link(document).await?;
        }
        let user = SapUser {
            username: input.username,
            employee_document: input.employee_document,
            active: input.active,
        };
        self.entries
            .write()
            .await
            .insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, username: &str, input: UpdateSapUserInput) -> Result<SapUser> {
        if let Some(Some(ref document)) = input.employee_document {
            self.check_link(document).await?;
        }

        let mut entries = self.entries.write().await;
        let user = entries
            .get_mut(username)
            .ok_or_else(|| DomainError::not_found("SapUser", username))?;

        if let Some(employee_document) = input.employee_document {
            user.employee_document = employee_document;
        }
        if let Some(active) = input.active {
            user.active = active;
        }
        Ok(user.clone())
    }

    async fn delete(&self, username: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("SapUser", username))
    }

    async fn list(&self, text_filter: Option<&str>) -> Result<Vec<SapUser>> {
        let entries = self.entries.read().await;
        let mut results: Vec<_> = entries
            .values()
            .filter(|u| {
                text_filter.is_none_or(|f| {
                    matches_filter(
                        &[Some(u.username.as_str()), u.employee_document.as_deref()],
                        f,
                    )
                })
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(results)
    }
}

#[async_trait::async_trait]
impl TransactionalStore for InMemorySapUserStore {
    async fn snapshot(&self) {
        *self.saved.write().await = Some(self.entries.read().await.clone());
    }

    async fn restore(&self) {
        if let Some(saved) = self.saved.write().await.take() {
            *self.entries.write().await = saved;
        }
    }

    async fn discard(&self) {
        self.saved.write().await.take();
    }
}
