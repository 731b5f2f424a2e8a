//! Injectable source of the current time.
//!
//! Issuance stamps the validity window from [`Clock::now`] and the renewal
//! evaluator compares against it, so tests and hosts can pin time for a whole
//! planning pass with [`FixedClock`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    inner: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(at),
        }
    }

    /// Clock pinned to a Unix timestamp in seconds.
    ///
    /// Out-of-range timestamps fall back to the epoch.
    pub fn at_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, delta: Duration) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
