//! Read-side queries over the audit trail.

use std::sync::Arc;

use custodia_core::Result;
use tracing::debug;

use crate::audit::{AuditLogRecord, AuditQueryStore};

/// Default page size when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 50;

/// Largest page a single query may return.
pub const MAX_LIMIT: usize = 200;

/// Service applying pagination and filter rules to audit queries.
pub struct AuditQueryService {
    store: Arc<dyn AuditQueryStore>,
}

impl AuditQueryService {
    /// Create a new audit query service.
    pub fn new(store: Arc<dyn AuditQueryStore>) -> Self {
        Self { store }
    }

    /// List recent audit records, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_LIMIT`] and is clamped to
    /// `[1, MAX_LIMIT]`. An empty aggregate filter means no filter.
    pub async fn list(
        &self,
        limit: Option<usize>,
        aggregate: Option<&str>,
    ) -> Result<Vec<AuditLogRecord>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let aggregate = aggregate.filter(|a| !a.is_empty());
        debug!(limit, aggregate = aggregate.unwrap_or("*"), "audit query");
        self.store.list(limit, aggregate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AdminChangeEventInput, AuditStore, InMemoryAuditStore};
    use crate::types::{CatalogAggregate, ChangeAction};
    use chrono::{TimeZone, Utc};
    use custodia_core::ActorId;

    async fn seeded_store(events: usize) -> Arc<InMemoryAuditStore> {
        let store = Arc::new(InMemoryAuditStore::new());
        for i in 0..events {
            store
                .append(AdminChangeEventInput {
                    aggregate: if i % 2 == 0 {
                        CatalogAggregate::Employee
                    } else {
                        CatalogAggregate::Device
                    },
                    action: ChangeAction::Created,
                    key: format!("key-{i}"),
                    at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
                    actor: ActorId::new(),
                    before: None,
                    after: None,
                    reason: None,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_default_limit_is_50() {
        let service = AuditQueryService::new(seeded_store(60).await);
        let records = service.list(None, None).await.unwrap();
        assert_eq!(records.len(), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn test_limit_is_clamped_to_bounds() {
        let service = AuditQueryService::new(seeded_store(5).await);

        let floor = service.list(Some(0), None).await.unwrap();
        assert_eq!(floor.len(), 1);

        let service = AuditQueryService::new(seeded_store(250).await);
        let ceiling = service.list(Some(1000), None).await.unwrap();
        assert_eq!(ceiling.len(), MAX_LIMIT);
    }

    #[tokio::test]
    async fn test_empty_aggregate_filter_means_no_filter() {
        let service = AuditQueryService::new(seeded_store(4).await);
        let records = service.list(Some(10), Some("")).await.unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn test_aggregate_filter_is_applied() {
        let service = AuditQueryService::new(seeded_store(4).await);
        let records = service.list(Some(10), Some("Device")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.aggregate == CatalogAggregate::Device));
    }
}
