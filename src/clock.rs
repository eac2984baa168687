//! Time source for token issuance and expiry checks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to, with one-second resolution.
#[derive(Debug)]
pub struct ManualClock {
    unix_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            unix_secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.unix_secs.store(at.timestamp(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.unix_secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.unix_secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
