//! Authorization subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayRequest (admitted)
//!     → authorizer.rs: extract request_id, source_ip, authorization, received_at
//!     → AuditStore::upsert (must finish before any decision)
//!     → verifier.rs: CredentialVerifier::verify
//!     → Decision { allowed, principal_context }
//! ```
//!
//! # Design Decisions
//! - Fail closed: an audit write that fails or times out denies the request
//! - Verification strategies never see the audit store
//! - No side effects beyond the audit write, so platform retries are safe

pub mod authorizer;
pub mod verifier;

pub use authorizer::Authorizer;
pub use verifier::{AlwaysAllow, CredentialVerifier, StaticTokenVerifier};
