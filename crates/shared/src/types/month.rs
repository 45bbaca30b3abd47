//! Calendar month key used by loan schedules, groups and projections.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted year.
pub const MIN_YEAR: i32 = 1900;
/// Largest accepted year.
pub const MAX_YEAR: i32 = 9999;

/// Errors produced while building a [`YearMonth`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthParseError {
    /// The text is not in `YYYY-MM` form.
    #[error("Invalid month format: {0} (expected YYYY-MM)")]
    InvalidFormat(String),

    /// Month number outside 1..=12.
    #[error("Invalid month number: {0}")]
    InvalidMonth(u32),

    /// Year outside the supported range.
    #[error("Year {0} is out of range")]
    YearOutOfRange(i32),
}

/// A calendar month, ordered by `(year, month)`.
///
/// Serializes as the `YYYY-MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month after validating both parts.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(MonthParseError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1-based.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The following month.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Month `n` months after this one.
    #[must_use]
    pub fn plus_months(self, n: u32) -> Self {
        (0..n).fold(self, |acc, _| acc.next())
    }

    /// Number of days in the month.
    #[must_use]
    pub const fn days_in_month(self) -> u32 {
        match self.month {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year) => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        self.clamp_day(1)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.clamp_day(self.days_in_month())
    }

    /// The date for `day` in this month, clamped to the month's last day.
    ///
    /// Day 0 is treated as day 1.
    #[must_use]
    pub fn clamp_day(self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        // Year and month are validated on construction, so the date exists.
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_default()
    }

    /// Whether `date` falls inside this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MonthParseError::InvalidFormat(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = MonthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}
