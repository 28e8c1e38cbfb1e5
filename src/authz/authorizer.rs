//! The per-request authorization decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audit::{AuditRecord, AuditStore, StoreError};
use crate::authz::verifier::CredentialVerifier;
use crate::error::GatewayError;
use crate::gateway::{Decision, GatewayRequest};
use crate::observability::metrics;

/// Extracts the caller's details, audits them, then asks the verifier.
///
/// The audit write always completes (or fails) before a decision is
/// returned. A request whose audit write fails is denied.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn AuditStore>,
    verifier: Arc<dyn CredentialVerifier>,
    write_timeout: Duration,
}

impl Authorizer {
    pub fn new(
        store: Arc<dyn AuditStore>,
        verifier: Arc<dyn CredentialVerifier>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            store,
            verifier,
            write_timeout,
        }
    }

    pub async fn authorize(&self, request: &GatewayRequest) -> Result<Decision, GatewayError> {
        let record = extract_record(request)?;
        let credential = record.credential.clone();

        if let Err(e) = self.persist(record).await {
            tracing::error!(
                request_id = %request.request_id,
                table = %self.store.table(),
                error = %e,
                "Audit write failed, denying request"
            );
            metrics::record_decision(false);
            return Err(GatewayError::AuditWrite(e));
        }

        let result = self.verifier.verify(&credential);
        let allowed = matches!(&result, Ok(d) if d.allowed);
        metrics::record_decision(allowed);

        tracing::info!(
            request_id = %request.request_id,
            source_ip = %request.source_ip,
            verifier = self.verifier.name(),
            allowed,
            "Authorization decision"
        );
        result
    }

    /// Write the record on its own task, bounded by the write timeout.
    ///
    /// The task is detached from the caller, so a dropped request (client
    /// disconnect, request timeout) does not abort a write in flight. A
    /// write that outlives `write_timeout` is abandoned and never lands.
    async fn persist(&self, record: AuditRecord) -> Result<(), StoreError> {
        let store = self.store.clone();
        let timeout = self.write_timeout;
        let start = Instant::now();

        let task = tokio::spawn(async move {
            match tokio::time::timeout(timeout, store.upsert(record)).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
            }
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::Unavailable(format!("audit task failed: {e}"))),
        };

        metrics::record_audit_write(if result.is_ok() { "ok" } else { "error" }, start);
        result
    }
}

/// Build the audit record from transport metadata.
///
/// The request id keys the record, so it cannot be absent. A missing
/// `authorization` header is recorded as an empty credential.
fn extract_record(request: &GatewayRequest) -> Result<AuditRecord, GatewayError> {
    if request.request_id.is_empty() {
        return Err(GatewayError::MalformedCredential(
            "request has no request id".to_string(),
        ));
    }

    Ok(AuditRecord {
        request_id: request.request_id.clone(),
        source_ip: request.source_ip.clone(),
        credential: request.header("authorization").unwrap_or_default().to_string(),
        received_at: request.received_at,
    })
}
