//! Time source abstraction
//!
//! Availability, cancellation eligibility and refund tiers are all functions
//! of "now". Threading a [`Clock`] through the services keeps that input
//! explicit, so tests pin it instead of racing the wall clock.

use chrono::{DateTime, Utc};

/// A source of the current instant
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current Unix timestamp in milliseconds
    fn now_millis(&self) -> i64 {
        self.now_utc().timestamp_millis()
    }
}

/// Wall-clock time source used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
