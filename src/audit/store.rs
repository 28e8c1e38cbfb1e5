//! Audit store interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::audit::record::AuditRecord;

/// Errors raised by an audit store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("audit store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The write did not complete within the configured bound.
    #[error("audit write timed out after {0} ms")]
    Timeout(u64),

    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for audit store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable, keyed persistence for audit records.
///
/// Implementations must make `upsert` idempotent per `request_id`: writing
/// the same key twice leaves one record holding the second write's values.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert or overwrite the record keyed by its `request_id`.
    async fn upsert(&self, record: AuditRecord) -> StoreResult<()>;

    /// Fetch a record by request id.
    async fn get(&self, request_id: &str) -> StoreResult<Option<AuditRecord>>;

    /// Number of distinct records held.
    async fn len(&self) -> StoreResult<usize>;

    /// Table or collection name, for logging.
    fn table(&self) -> &str;
}
