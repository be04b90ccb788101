use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid date key {0:?}, expected YYYY-MM-DD")]
pub struct InvalidDateKey(pub String);

/// A civil calendar date in `YYYY-MM-DD` form.
///
/// The key carries no time zone. It is obtained from an instant through
/// [`super::civil::instant_to_date_key`] and from then on only takes part in
/// calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Strictly parses `YYYY-MM-DD`. Month and day overflow ("2024-02-30")
    /// are rejected by constructing the calendar date from the fields.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }

        let number = |range: std::ops::Range<usize>| -> Option<u32> {
            bytes[range].iter().try_fold(0u32, |acc, b| {
                b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
            })
        };

        let year = number(0..4)?;
        let month = number(5..7)?;
        let day = number(8..10)?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }

        NaiveDate::from_ymd_opt(year as i32, month, day).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Calendar-correct day arithmetic. `None` only when the result leaves
    /// the representable date range.
    pub fn add_days(&self, days: i64) -> Option<Self> {
        let delta = TimeDelta::try_days(days)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Whole days from `self` to `other`; negative when `other` is earlier.
    pub fn days_until(&self, other: DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }
}

pub fn days_between(start: DateKey, end: DateKey) -> i64 {
    start.days_until(end)
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl FromStr for DateKey {
    type Err = InvalidDateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidDateKey(s.to_owned()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = InvalidDateKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
