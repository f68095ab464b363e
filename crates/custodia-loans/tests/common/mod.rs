//! Common test utilities for custodia-loans integration tests.
//!
//! All tests run against the in-memory port implementations with a fixed
//! clock, wired the same way a storage-free embedding would wire them.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use custodia_core::ActorId;
use custodia_loans::audit::InMemoryAuditStore;
use custodia_loans::catalog::{
    CreateDeviceInput, CreateEmployeeInput, CreateSapUserInput, InMemoryDeviceStore,
    InMemoryEmployeeStore, InMemorySapUserStore,
};
use custodia_loans::clock::FixedClock;
use custodia_loans::loan::InMemoryLoanStore;
use custodia_loans::services::{AuditQueryService, CatalogService, LoanService};
use custodia_loans::uow::{InMemoryUnitOfWork, TransactionalStore, UnitOfWork};

/// Morning instant used as the default test clock: 2024-01-01T08:00:00Z.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// All the in-memory stores for test isolation.
#[derive(Clone)]
pub struct TestStores {
    pub employees: Arc<InMemoryEmployeeStore>,
    pub devices: Arc<InMemoryDeviceStore>,
    pub sap_users: Arc<InMemorySapUserStore>,
    pub loans: Arc<InMemoryLoanStore>,
    pub audit: Arc<InMemoryAuditStore>,
}

impl TestStores {
    /// Create a new set of isolated test stores.
    pub fn new() -> Self {
        let employees = Arc::new(InMemoryEmployeeStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let sap_users = Arc::new(InMemorySapUserStore::new(employees.clone()));
        Self {
            employees,
            devices,
            sap_users,
            loans: Arc::new(InMemoryLoanStore::new()),
            audit: Arc::new(InMemoryAuditStore::new()),
        }
    }

    /// Every store as a unit-of-work participant.
    pub fn participants(&self) -> Vec<Arc<dyn TransactionalStore>> {
        vec![
            self.employees.clone(),
            self.devices.clone(),
            self.sap_users.clone(),
            self.loans.clone(),
            self.audit.clone(),
        ]
    }
}

impl Default for TestStores {
    fn default() -> Self {
        Self::new()
    }
}

/// All services for integration testing.
pub struct TestServices {
    pub loans: LoanService,
    pub catalog: CatalogService,
    pub audit: AuditQueryService,
}

impl TestServices {
    /// Wire services over the given stores, unit of work, and clock.
    pub fn new(stores: &TestStores, uow: Arc<dyn UnitOfWork>, clock: Arc<FixedClock>) -> Self {
        Self {
            loans: LoanService::new(
                stores.employees.clone(),
                stores.devices.clone(),
                stores.sap_users.clone(),
                stores.loans.clone(),
                uow.clone(),
            ),
            catalog: CatalogService::new(
                stores.employees.clone(),
                stores.devices.clone(),
                stores.sap_users.clone(),
                stores.audit.clone(),
                uow,
                clock,
            ),
            audit: AuditQueryService::new(stores.audit.clone()),
        }
    }
}

/// Full test context: stores, services, a fixed clock, and a known actor.
pub struct TestContext {
    pub stores: TestStores,
    pub services: TestServices,
    pub clock: Arc<FixedClock>,
    pub actor: ActorId,
}

impl TestContext {
    /// Create a context wired with the snapshotting in-memory unit of work.
    pub fn new() -> Self {
        let stores = TestStores::new();
        let clock = Arc::new(FixedClock::new(morning()));
        let uow = Arc::new(InMemoryUnitOfWork::new(stores.participants()));
        let services = TestServices::new(&stores, uow, clock.clone());
        Self {
            stores,
            services,
            clock,
            actor: ActorId::new(),
        }
    }

    /// Seed one active employee, device, and SAP user through the catalog
    /// service, then clear the audit events the seeding produced.
    pub async fn seed_catalog(&self) {
        self.services
            .catalog
            .create_employee(
                CreateEmployeeInput {
                    document: "1234567890".to_string(),
                    name: "Ana Perez".to_string(),
                    active: true,
                },
                self.actor,
                None,
            )
            .await
            .expect("seed employee");
        self.services
            .catalog
            .create_device(
                CreateDeviceInput {
                    code: "RF-001".to_string(),
                    description: Some("warehouse handset".to_string()),
                    active: true,
                },
                self.actor,
                None,
            )
            .await
            .expect("seed device");
        self.services
            .catalog
            .create_sap_user(
                CreateSapUserInput {
                    username: "sap-user".to_string(),
                    employee_document: Some("1234567890".to_string()),
                    active: true,
                },
                self.actor,
                None,
            )
            .await
            .expect("seed sap user");
        self.stores.audit.clear().await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
