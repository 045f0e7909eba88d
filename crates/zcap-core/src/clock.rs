//! Injectable wall clock.
//!
//! Every timestamp the engine mints is truncated to millisecond precision,
//! matching the canonical serialization, so issued documents round-trip
//! bit-identically through the codec.

use chrono::{DateTime, Duration, Timelike, Utc};
use parking_lot::RwLock;

/// Wall-clock source used for issuance, expiry, and freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Truncate an instant to millisecond precision.
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_nanosecond(instant.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(instant)
}

/// System UTC clock. The default for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_millis(Utc::now())
    }
}

/// Settable clock for tests.
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(truncate_to_millis(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.write() = truncate_to_millis(instant);
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.write();
        *instant += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read()
    }
}
