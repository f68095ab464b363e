//! Append-only audit trail for catalog administration.
//!
//! Every create/update/delete of an employee, device, or SAP user appends
//! one [`AdminChangeEvent`] carrying actor attribution and before/after
//! snapshots of the mutated fields. Events are immutable once appended and
//! totally ordered by append sequence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use custodia_core::{ActorId, AuditEventId, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::types::{CatalogAggregate, ChangeAction};
use crate::uow::TransactionalStore;

// ============================================================================
// Domain Types
// ============================================================================

/// An immutable record of one catalog mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminChangeEvent {
    /// Unique identifier for the event.
    pub id: AuditEventId,
    /// The catalog the mutation touched.
    pub aggregate: CatalogAggregate,
    /// Kind of mutation.
    pub action: ChangeAction,
    /// Business key of the mutated entity.
    pub key: String,
    /// When the mutation happened, per the injected clock.
    pub at: DateTime<Utc>,
    /// Actor who performed the mutation.
    pub actor: ActorId,
    /// Mutable fields before the change (absent for creates).
    pub before: Option<serde_json::Value>,
    /// Mutable fields after the change (absent for deletes).
    pub after: Option<serde_json::Value>,
    /// Free-text justification supplied by the actor.
    pub reason: Option<String>,
}

/// Input for appending an audit event. The store assigns the event id.
#[derive(Debug, Clone)]
pub struct AdminChangeEventInput {
    /// The catalog the mutation touched.
    pub aggregate: CatalogAggregate,
    /// Kind of mutation.
    pub action: ChangeAction,
    /// Business key of the mutated entity.
    pub key: String,
    /// When the mutation happened.
    pub at: DateTime<Utc>,
    /// Actor who performed the mutation.
    pub actor: ActorId,
    /// Mutable fields before the change.
    pub before: Option<serde_json::Value>,
    /// Mutable fields after the change.
    pub after: Option<serde_json::Value>,
    /// Free-text justification.
    pub reason: Option<String>,
}

/// Queryable projection of an [`AdminChangeEvent`].
///
/// Adds the actor's resolved display name. The label is a read-side cache
/// filled in by the query adapter; it is absent when the actor is unknown
/// to that adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogRecord {
    /// Unique identifier for the event.
    pub id: AuditEventId,
    /// The catalog the mutation touched.
    pub aggregate: CatalogAggregate,
    /// Kind of mutation.
    pub action: ChangeAction,
    /// Business key of the mutated entity.
    pub key: String,
    /// When the mutation happened.
    pub at: DateTime<Utc>,
    /// Actor who performed the mutation.
    pub actor: ActorId,
    /// Actor display name, when the adapter can resolve it.
    pub actor_label: Option<String>,
    /// Mutable fields before the change.
    pub before: Option<serde_json::Value>,
    /// Mutable fields after the change.
    pub after: Option<serde_json::Value>,
    /// Free-text justification.
    pub reason: Option<String>,
}

// ============================================================================
// Store Traits
// ============================================================================

/// Write port for the audit trail.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one event. Events are never updated or deleted afterwards.
    async fn append(&self, input: AdminChangeEventInput) -> Result<AdminChangeEvent>;
}

/// Read port for the audit trail.
#[async_trait::async_trait]
pub trait AuditQueryStore: Send + Sync {
    /// List the most recent records, newest first, optionally restricted to
    /// one aggregate name.
    async fn list(&self, limit: usize, aggregate: Option<&str>) -> Result<Vec<AuditLogRecord>>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory audit store serving both the append and the query port.
///
/// Keeps events in append order. The actor directory backing the
/// `actor_label` projection is seedable for tests.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    events: Arc<RwLock<Vec<AdminChangeEvent>>>,
    saved: Arc<RwLock<Option<Vec<AdminChangeEvent>>>>,
    actors: Arc<RwLock<HashMap<ActorId, String>>>,
}

impl InMemoryAuditStore {
    /// Create a new in-memory audit store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor display name for the `actor_label` projection.
    pub async fn seed_actor(&self, actor: ActorId, label: impl Into<String>) {
        self.actors.write().await.insert(actor, label.into());
    }

    /// Get the count of events in the store.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Get all events in append order (for testing).
    pub async fn get_all(&self) -> Vec<AdminChangeEvent> {
        self.events.read().await.clone()
    }

    /// Clear all events (for testing).
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, input: AdminChangeEventInput) -> Result<AdminChangeEvent> {
        let event = AdminChangeEvent {
            id: AuditEventId::new(),
            aggregate: input.aggregate,
            action: input.action,
            key: input.key,
            at: input.at,
            actor: input.actor,
            before: input.before,
            after: input.after,
            reason: input.reason,
        };

        info!(
            aggregate = %event.aggregate,
            action = %event.action,
            key = %event.key,
            actor = %event.actor,
            "audit event appended"
        );

        self.events.write().await.push(event.clone());
        Ok(event)
    }
}

#[async_trait::async_trait]
impl AuditQueryStore for InMemoryAuditStore {
    async fn list(&self, limit: usize, aggregate: Option<&str>) -> Result<Vec<AuditLogRecord>> {
        let events = self.events.read().await;
        let actors = self.actors.read().await;

        Ok(events
            .iter()
            .rev() // append order, newest first
            .filter(|e| aggregate.is_none_or(|a| e.aggregate.as_str() == a))
            .take(limit)
            .map(|e| AuditLogRecord {
                id: e.id,
                aggregate: e.aggregate,
                action: e.action,
                key: e.key.clone(),
                at: e.at,
                actor: e.actor,
                actor_label: actors.get(&e.actor).cloned(),
                before: e.before.clone(),
                after: e.after.clone(),
                reason: e.reason.clone(),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl TransactionalStore for InMemoryAuditStore {
    async fn snapshot(&self) {
        *self.saved.write().await = Some(self.events.read().await.clone());
    }

    async fn restore(&self) {
        if let Some(saved) = self.saved.write().await.take() {
            *self.events.write().await = saved;
        }
    }

    async fn discard(&self) {
        self.saved.write().await.take();
    }
}
