//! Brute-force lockout for secure-mode logins.
//!
//! Flow Overview:
//! 1) Failures are counted per client key inside a window that starts at the
//!    first failure.
//! 2) The 5th failure inside the window locks the key for 15 minutes.
//! 3) A failure after the window has elapsed restarts the count at 1.
//! 4) A successful login removes the record.
//!
//! An expired lock is only dropped from the table by the next failure or
//! success, but `is_locked` stops reporting it as soon as the clock passes it.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const LOCK_DURATION: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailedAttemptRecord {
    pub count: u32,
    pub first_attempt: Instant,
    pub locked_until: Option<Instant>,
}

impl FailedAttemptRecord {
    fn first(now: Instant) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            locked_until: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct LockoutTracker {
    records: Mutex<HashMap<String, FailedAttemptRecord>>,
}

impl LockoutTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_locked(&self, key: &str) -> bool {
        self.is_locked_at(key, Instant::now()).await
    }

    pub async fn is_locked_at(&self, key: &str, now: Instant) -> bool {
        let records = self.records.lock().await;
        records
            .get(key)
            .and_then(|record| record.locked_until)
            .is_some_and(|until| now < until)
    }

    pub async fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now()).await;
    }

    pub async fn record_failure_at(&self, key: &str, now: Instant) {
        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(key) else {
            records.insert(key.to_string(), FailedAttemptRecord::first(now));
            debug!(key, "first failed attempt");
            return;
        };

        if now.saturating_duration_since(record.first_attempt) > ATTEMPT_WINDOW {
            *record = FailedAttemptRecord::first(now);
            debug!(key, "attempt window elapsed, counter restarted");
            return;
        }

        record.count += 1;
        if record.count >= MAX_FAILED_ATTEMPTS {
            record.locked_until = Some(now + LOCK_DURATION);
            warn!(key, count = record.count, "client locked out");
        }
    }

    pub async fn clear(&self, key: &str) {
        self.records.lock().await.remove(key);
    }

    pub async fn record(&self, key: &str) -> Option<FailedAttemptRecord> {
        self.records.lock().await.get(key).copied()
    }
}
