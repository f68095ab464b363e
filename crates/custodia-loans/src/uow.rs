//! Unit-of-work port.
//!
//! Every mutating service operation runs inside one unit of work: acquired
//! at entry, committed on clean completion, rolled back on any error. The
//! choice of implementation is explicit at wiring time; there is no
//! implicit non-transactional default.

use std::sync::Arc;

use custodia_core::Result;
use tokio::sync::RwLock;
use tracing::debug;

/// Port for the atomic scope surrounding a mutating operation.
///
/// Driven by the services: `begin` at entry, then exactly one of `commit`
/// or `rollback` on every exit path. Production adapters map these onto the
/// persistence collaborator's transactions; the check-then-act sequences in
/// the services rely on that collaborator's isolation for cross-caller
/// safety.
#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Open the atomic scope.
    async fn begin(&self) -> Result<()>;

    /// Make every write inside the scope durable.
    async fn commit(&self) -> Result<()>;

    /// Discard every write inside the scope.
    async fn rollback(&self) -> Result<()>;
}

/// Explicit no-op unit of work.
///
/// Satisfies the scoped-acquisition contract without any transactional
/// behavior. For lightweight embeddings and tests that do not exercise
/// atomicity; choosing it is always a visible wiring decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUnitOfWork;

impl NullUnitOfWork {
    /// Create a new no-op unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UnitOfWork for NullUnitOfWork {
    async fn begin(&self) -> Result<()> {
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

/// Participation contract for stores managed by [`InMemoryUnitOfWork`].
///
/// Each in-memory store keeps one pending snapshot of its state; the unit
/// of work drives snapshot, restore, and discard across every registered
/// store so a rollback rewinds all of them together.
#[async_trait::async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Capture the current state as the pending snapshot.
    async fn snapshot(&self);

    /// Rewind to the pending snapshot, dropping it.
    async fn restore(&self);

    /// Drop the pending snapshot, keeping the current state.
    async fn discard(&self);
}

/// Unit of work over in-memory stores.
///
/// Snapshots every registered store on `begin` and restores them on
/// `rollback`, which makes atomicity observable in tests. It does not
/// emulate transaction isolation between concurrent scopes; that remains
/// the persistence collaborator's concern in production.
pub struct InMemoryUnitOfWork {
    stores: Vec<Arc<dyn TransactionalStore>>,
    active: RwLock<bool>,
}

impl InMemoryUnitOfWork {
    /// Create a unit of work coordinating the given stores.
    #[must_use]
    pub fn new(stores: Vec<Arc<dyn TransactionalStore>>) -> Self {
        Self {
            stores,
            active: RwLock::new(false),
        }
    }
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn begin(&self) -> Result<()> {
        for store in &self.stores {
            store.snapshot().await;
        }
        *self.active.write().await = true;
        debug!(stores = self.stores.len(), "unit of work opened");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        for store in &self.stores {
            store.discard().await;
        }
        *self.active.write().await = false;
        debug!("unit of work committed");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        for store in &self.stores {
            store.restore().await;
        }
        *self.active.write().await = false;
        debug!("unit of work rolled back");
        Ok(())
    }
}
