//! The audit record persisted once per inbound request.

use serde::{Deserialize, Serialize};

/// Who called, when, and with what credential.
///
/// Serialized with the persisted field names `request_id`, `source_ip`,
/// `auth` and `epoch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Transport-assigned request id. Primary key.
    pub request_id: String,
    /// Caller address as seen by the transport.
    pub source_ip: String,
    /// Raw `authorization` header value, empty when absent.
    #[serde(rename = "auth")]
    pub credential: String,
    /// Epoch seconds at which the request was received.
    #[serde(rename = "epoch")]
    pub received_at: i64,
}
