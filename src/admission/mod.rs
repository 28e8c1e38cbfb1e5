//! Admission control.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → Admission::admit(now)
//!         false → Throttled (429), nothing audited
//!         true  → Authorizer
//! ```
//!
//! # Design Decisions
//! - Independent of caller identity; one bucket per process
//! - The bucket is an injected object, never a global
//! - Limits change only on restart or explicit reconfiguration

pub mod token_bucket;

pub use token_bucket::{BucketSnapshot, TokenBucket};

use std::time::Instant;

/// Edge admission policy.
pub trait Admission: Send + Sync {
    /// Returns true and consumes capacity if the request may proceed.
    fn admit(&self, now: Instant) -> bool;
}

/// Admits everything. Used when admission control is disabled.
pub struct Unlimited;

impl Admission for Unlimited {
    fn admit(&self, _now: Instant) -> bool {
        true
    }
}
