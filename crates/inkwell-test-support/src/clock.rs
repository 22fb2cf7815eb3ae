//! Deterministic clock.

use chrono::{DateTime, TimeZone, Utc};
use inkwell_core::clock::Clock;

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Stops the clock at `year-month-day hour:minute` UTC.
    ///
    /// # Panics
    ///
    /// Panics if the date is not valid.
    #[must_use]
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap())
    }
}

impl Default for FixedClock {
    /// 2026-01-15 10:00 UTC.
    fn default() -> Self {
        Self::at(2026, 1, 15, 10, 0)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
