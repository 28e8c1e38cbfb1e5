//! Audit subsystem.
//!
//! # Data Flow
//! ```text
//! Authorizer
//!     → AuditRecord (request_id, source_ip, auth, epoch)
//!     → AuditStore::upsert (bounded by audit.write_timeout_ms)
//!     → memory.rs (DashMap) or file.rs (append-only JSON lines)
//! ```
//!
//! # Design Decisions
//! - One record per request id; writes are idempotent upserts
//! - Retention is the storage layer's concern, nothing here expires records

pub mod file;
pub mod memory;
pub mod record;
pub mod store;

pub use file::FileAuditStore;
pub use memory::MemoryAuditStore;
pub use record::AuditRecord;
pub use store::{AuditStore, StoreError, StoreResult};

use std::path::Path;
use std::sync::Arc;

use crate::config::{AuditBackend, AuditConfig};

/// Build the audit store selected by configuration.
pub async fn open_store(config: &AuditConfig) -> StoreResult<Arc<dyn AuditStore>> {
    let store: Arc<dyn AuditStore> = match config.backend {
        AuditBackend::Memory => Arc::new(MemoryAuditStore::new(config.table.clone())),
        AuditBackend::File => Arc::new(
            FileAuditStore::open(Path::new(&config.directory), &config.table, config.sync_writes)
                .await?,
        ),
    };

    tracing::info!(
        backend = ?config.backend,
        table = %store.table(),
        "Audit store ready"
    );
    Ok(store)
}
