//! Process-wide token bucket.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Instant;

use crate::admission::Admission;
use crate::config::AdmissionConfig;
use crate::observability::metrics;

struct BucketState {
    tokens: f64,
    last_update: Instant,
    capacity: f64,
    refill_rate: f64,
}

impl BucketState {
    fn refill(&mut self, now: Instant) {
        // Callers may race on `now`; an older instant refills nothing.
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        if now > self.last_update {
            self.last_update = now;
        }
    }
}

/// Current bucket state, as reported by the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub available_tokens: f64,
    pub burst_capacity: u32,
    pub sustained_rate: f64,
}

/// A token bucket shared by every request path.
///
/// Refills `sustained_rate` tokens per second up to `burst_capacity`, and
/// starts full. All state sits behind one short critical section so that
/// concurrent admits never spend the same token twice.
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(burst_capacity: u32, sustained_rate: f64) -> Self {
        Self::starting_at(burst_capacity, sustained_rate, Instant::now())
    }

    /// Create a full bucket whose refill clock starts at `now`.
    pub fn starting_at(burst_capacity: u32, sustained_rate: f64, now: Instant) -> Self {
        let capacity = burst_capacity as f64;
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_update: now,
                capacity,
                refill_rate: sustained_rate,
            }),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.burst_capacity, config.sustained_rate)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        // The critical sections never panic midway, so a poisoned state is intact.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply new limits. Available tokens are clamped to the new ceiling.
    pub fn reconfigure(&self, burst_capacity: u32, sustained_rate: f64) {
        let mut state = self.lock();
        state.refill(Instant::now());
        state.capacity = burst_capacity as f64;
        state.refill_rate = sustained_rate;
        state.tokens = state.tokens.min(state.capacity);

        tracing::info!(burst_capacity, sustained_rate, "Admission limits reconfigured");
    }

    pub fn snapshot(&self) -> BucketSnapshot {
        let mut state = self.lock();
        state.refill(Instant::now());
        BucketSnapshot {
            available_tokens: state.tokens,
            burst_capacity: state.capacity as u32,
            sustained_rate: state.refill_rate,
        }
    }
}

impl Admission for TokenBucket {
    fn admit(&self, now: Instant) -> bool {
        let mut state = self.lock();
        state.refill(now);

        let admitted = if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        };
        metrics::record_admission_tokens(state.tokens);
        admitted
    }
}
