use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::{Arc, RwLock};

/// Source of "now" for the ledger. Daily tallies roll over on the UTC date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date key, `YYYY-MM-DD`.
    fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }

    /// ISO-8601 with milliseconds, e.g. `2026-10-16T09:30:00.000Z`.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_formats_date_and_timestamp() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap());
        assert_eq!(clock.today(), "2026-10-16");
        assert_eq!(clock.timestamp(), "2026-10-16T09:30:00.000Z");
    }

    #[test]
    fn test_fixed_clock_advance_rolls_date() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 23, 0, 0).unwrap());
        let handle = clock.clone();
        handle.advance(Duration::hours(2));
        assert_eq!(clock.today(), "2026-10-17");
    }
}
