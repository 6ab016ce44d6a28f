use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `then` and `now`, floored. Negative when `then` lies
/// in the future.
pub fn elapsed_days(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Calendar day of `instant` as seen in `tz`.
pub fn calendar_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Which clock calendar-day bucketing follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZonePolicy {
    Utc,
    /// Device-local offset, sampled when `now()` is called.
    Local,
    Fixed(FixedOffset),
}

impl TimeZonePolicy {
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZonePolicy::Utc => Utc::now().fixed_offset(),
            TimeZonePolicy::Local => Local::now().fixed_offset(),
            TimeZonePolicy::Fixed(offset) => Utc::now().with_timezone(offset),
        }
    }
}

impl FromStr for TimeZonePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "utc" | "" => Ok(TimeZonePolicy::Utc),
            "local" => Ok(TimeZonePolicy::Local),
            other => other
                .parse::<FixedOffset>()
                .map(TimeZonePolicy::Fixed)
                .map_err(|e| format!("Invalid timezone '{}': {}", value, e)),
        }
    }
}
