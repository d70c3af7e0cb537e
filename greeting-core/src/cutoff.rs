//! The end-of-season cutoff.
//!
//! Generation is only offered before a fixed instant. There is no override;
//! tests inject a [`Clock`] instead.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
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

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self
            .now
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .now
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Fixed instant after which generation is no longer offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffPolicy {
    cutoff: DateTime<Utc>,
}

impl CutoffPolicy {
    /// Policy ending at `cutoff`.
    #[must_use]
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// The season's end: local midnight starting 1 January 2026.
    #[must_use]
    pub fn season() -> Self {
        let midnight = NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let cutoff = Local
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&midnight), |t| t.with_timezone(&Utc));
        Self { cutoff }
    }

    /// The cutoff instant.
    #[must_use]
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Whether `now` is at or past the cutoff.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.cutoff
    }

    /// Whether the clock reads at or past the cutoff.
    #[must_use]
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.is_expired_at(clock.now())
    }
}

impl Default for CutoffPolicy {
    fn default() -> Self {
        Self::season()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn instant(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().expect("valid date")
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let policy = CutoffPolicy::new(instant(2026, 1, 1));
        assert!(!policy.is_expired_at(instant(2026, 1, 1) - Duration::seconds(1)));
        assert!(policy.is_expired_at(instant(2026, 1, 1)));
        assert!(policy.is_expired_at(instant(2026, 3, 1)));
    }

    #[test]
    fn test_season_cutoff_is_new_year_2026() {
        let cutoff = CutoffPolicy::season().cutoff();
        // Local midnight lands within a day of UTC midnight for every zone.
        let utc_midnight = instant(2026, 1, 1);
        assert!((cutoff - utc_midnight).num_hours().abs() <= 14);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(instant(2025, 12, 24));
        let policy = CutoffPolicy::new(instant(2026, 1, 1));
        assert!(!policy.is_expired(&clock));
        clock.set(instant(2026, 1, 2));
        assert!(policy.is_expired(&clock));
    }
}
