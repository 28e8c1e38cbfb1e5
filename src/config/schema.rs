//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, client address trust).
    pub listener: ListenerConfig,

    /// Admission control (token bucket) settings.
    pub admission: AdmissionConfig,

    /// Audit store settings.
    pub audit: AuditConfig,

    /// Credential verification settings.
    pub authz: AuthzConfig,

    /// Downstream handler settings.
    pub handler: HandlerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Take the source address from the first `X-Forwarded-For` entry
    /// instead of the TCP peer. Only enable behind a trusted proxy.
    pub trust_forwarded_for: bool,

    /// Keep an inbound `x-request-id` as the audit key instead of assigning
    /// a fresh one. Only enable behind a trusted proxy that sets it.
    pub trust_request_id: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            trust_forwarded_for: false,
            trust_request_id: false,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Maximum tokens the bucket holds (burst ceiling).
    pub burst_capacity: u32,

    /// Tokens added per second (sustained rate).
    pub sustained_rate: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst_capacity: 50,
            sustained_rate: 100.0,
        }
    }
}

/// Which audit store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditBackend {
    Memory,
    File,
}

/// Audit store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub backend: AuditBackend,

    /// Table name. Overridden by the `JWTTABLE` environment variable.
    pub table: String,

    /// Directory holding file-backed tables.
    pub directory: String,

    /// Upper bound on a single audit write, in milliseconds.
    pub write_timeout_ms: u64,

    /// Flush each record to stable storage before acknowledging it.
    pub sync_writes: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: AuditBackend::File,
            table: "jwt-history".to_string(),
            directory: "./audit".to_string(),
            write_timeout_ms: 3000,
            sync_writes: true,
        }
    }
}

/// Credential verification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierKind {
    /// Allow every request, whatever the credential.
    AlwaysAllow,
    /// Allow only configured bearer tokens.
    StaticToken,
}

/// A bearer token accepted by the static token verifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub token: String,
    /// Principal name forwarded to the handler in the decision context.
    pub principal: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub strategy: VerifierKind,
    pub tokens: Vec<TokenConfig>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            strategy: VerifierKind::AlwaysAllow,
            tokens: Vec::new(),
        }
    }
}

/// Downstream handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Upstream `host:port` (e.g., "backend:3000"). When unset the built-in
    /// prompt handler answers requests.
    pub upstream: Option<String>,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            timeout_secs: 25,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
