//! In-memory audit store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::audit::record::AuditRecord;
use crate::audit::store::{AuditStore, StoreResult};

/// A thread-safe, non-durable audit store.
///
/// Used for tests and ephemeral deployments.
#[derive(Clone, Default)]
pub struct MemoryAuditStore {
    table: String,
    inner: Arc<DashMap<String, AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            inner: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn upsert(&self, record: AuditRecord) -> StoreResult<()> {
        self.inner.insert(record.request_id.clone(), record);
        Ok(())
    }

    async fn get(&self, request_id: &str) -> StoreResult<Option<AuditRecord>> {
        Ok(self.inner.get(request_id).map(|r| r.value().clone()))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.inner.len())
    }

    fn table(&self) -> &str {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ip: &str, epoch: i64) -> AuditRecord {
        AuditRecord {
            request_id: id.to_string(),
            source_ip: ip.to_string(),
            credential: String::new(),
            received_at: epoch,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryAuditStore::new("t");
        store.upsert(record("r1", "1.1.1.1", 1)).await.unwrap();
        store.upsert(record("r1", "2.2.2.2", 2)).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let stored = store.get("r1").await.unwrap().unwrap();
        assert_eq!(stored.source_ip, "2.2.2.2");
        assert_eq!(stored.received_at, 2);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = MemoryAuditStore::new("t");
        assert!(store.get("nope").await.unwrap().is_none());
        assert_eq!(store.table(), "t");
    }
}
