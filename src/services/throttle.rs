// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Failed-login throttling, keyed by normalized e-mail.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

pub const MAX_FAILURES: u32 = 5;
/// Failures count toward a lockout within this window, and a lockout lasts as long.
pub const LOCKOUT_MINUTES: i64 = 15;

/// Size above which stale entries are swept on each failure.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Attempts {
    failures: u32,
    first_failure: DateTime<Utc>,
    locked_until: Option<DateTime<Utc>>,
}

impl Attempts {
    /// Neither locked nor inside a failure window at `now`.
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) => until <= now,
            None => now - self.first_failure >= Duration::minutes(LOCKOUT_MINUTES),
        }
    }
}

/// In-memory login throttle shared by all request handlers.
#[derive(Default)]
pub struct LoginThrottle {
    attempts: DashMap<String, Attempts>,
}

impl LoginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lockout, if `key` is locked at `now`.
    pub fn locked_for(&self, key: &str, now: DateTime<Utc>) -> Option<Duration> {
        let entry = self.attempts.get(key)?;
        let until = entry.locked_until?;
        (until > now).then(|| until - now)
    }

    /// Record a failure; returns true if this failure triggered a lockout.
    pub fn record_failure(&self, key: &str, now: DateTime<Utc>) -> bool {
        if self.attempts.len() > PRUNE_THRESHOLD {
            self.attempts.retain(|_, attempts| !attempts.is_stale(now));
        }

        let mut entry = self.attempts.entry(key.to_string()).or_insert(Attempts {
            failures: 0,
            first_failure: now,
            locked_until: None,
        });

        // An expired lockout or window starts afresh.
        if entry.is_stale(now) {
            *entry = Attempts {
                failures: 0,
                first_failure: now,
                locked_until: None,
            };
        }

        entry.failures += 1;
        if entry.failures >= MAX_FAILURES {
            entry.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
            tracing::warn!(key, failures = entry.failures, "Login locked out");
            return true;
        }
        false
    }

    pub fn record_success(&self, key: &str) {
        self.attempts.remove(key);
    }

    /// Number of tracked e-mail addresses.
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_locks_after_max_failures() {
        let throttle = LoginThrottle::new();
        for _ in 0..MAX_FAILURES - 1 {
            assert!(!throttle.record_failure("rep@college.edu", t0()));
        }
        assert!(throttle.locked_for("rep@college.edu", t0()).is_none());

        assert!(throttle.record_failure("rep@college.edu", t0()));
        assert_eq!(
            throttle.locked_for("rep@college.edu", t0()),
            Some(Duration::minutes(LOCKOUT_MINUTES))
        );
        // Other accounts are unaffected
        assert!(throttle.locked_for("other@college.edu", t0()).is_none());
    }

    #[test]
    fn test_lockout_expires() {
        let throttle = LoginThrottle::new();
        for _ in 0..MAX_FAILURES {
            throttle.record_failure("a", t0());
        }
        let later = t0() + Duration::minutes(LOCKOUT_MINUTES);
        assert!(throttle.locked_for("a", later).is_none());

        // The next failure counts from one again
        assert!(!throttle.record_failure("a", later));
        assert!(throttle.locked_for("a", later).is_none());
    }

    #[test]
    fn test_old_failures_expire() {
        let throttle = LoginThrottle::new();
        for _ in 0..MAX_FAILURES - 1 {
            throttle.record_failure("a", t0() - Duration::days(365));
        }
        assert!(!throttle.record_failure("a", t0()));
        assert!(throttle.locked_for("a", t0()).is_none());

        // Failures spread over more than the window never lock.
        for i in 0..MAX_FAILURES as i64 * 2 {
            assert!(!throttle.record_failure("b", t0() + Duration::minutes(4 * i)));
        }
    }

    #[test]
    fn test_stale_entries_pruned() {
        let throttle = LoginThrottle::new();
        for i in 0..=PRUNE_THRESHOLD {
            throttle.record_failure(&format!("spray{i}@example.com"), t0());
        }
        assert_eq!(throttle.tracked(), PRUNE_THRESHOLD + 1);

        let later = t0() + Duration::minutes(LOCKOUT_MINUTES);
        throttle.record_failure("rep@college.edu", later);
        assert_eq!(throttle.tracked(), 1);
    }

    #[test]
    fn test_success_clears() {
        let throttle = LoginThrottle::new();
        for _ in 0..MAX_FAILURES - 1 {
            throttle.record_failure("a", t0());
        }
        throttle.record_success("a");
        assert!(!throttle.record_failure("a", t0()));
    }
}
