//! Injectable time source
//!
//! Every component that needs "now" receives a [`Clock`] at construction
//! instead of calling `Utc::now()` directly, so token expiry arithmetic can be
//! pinned to an exact instant in tests.
//!
//! # Example
//!
//! ```
//! use shiharai_shared::clock::{Clock, FixedClock};
//! use chrono::{TimeZone, Utc};
//!
//! let instant = Utc.with_ymd_and_hms(2024, 1, 1, 1, 23, 45).unwrap();
//! let clock = FixedClock::new(instant);
//! assert_eq!(clock.now(), instant);
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant
///
/// Used by tests and fixtures. Interior mutability lets a test move time
/// forward while flows hold a shared reference.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock that always reports `instant`
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Pins the clock to a new instant
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard = instant;
    }

    /// Moves the clock forward (or backward for negative durations)
    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}
