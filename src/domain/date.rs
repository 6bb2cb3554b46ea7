//! Calendar dates for due dates and overdue checks
//!
//! Dates travel as `YYYY-MM-DD` text. Parsing first checks the shape of the
//! string, then the numeric ranges, using the proleptic Gregorian calendar
//! for years 1 through 9999.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date format: expected YYYY-MM-DD, got '{0}'")]
    Malformed(String),

    #[error("Date does not exist in the calendar: '{0}'")]
    Impossible(String),
}

/// Returns true if `year` has a February 29th
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the number of days in `month` (1-12) of `year`, 0 for a month out of range
pub fn days_in_month(month: i32, year: i32) -> i32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Returns true if the day/month/year triple names a real date in years 1-9999
pub fn is_valid_date(day: i32, month: i32, year: i32) -> bool {
    (1..=9999).contains(&year)
        && (1..=12).contains(&month)
        && day >= 1
        && day <= days_in_month(month, year)
}

/// Returns true if `due` is strictly before `reference`.
///
/// Both arguments are `YYYY-MM-DD` strings. Anything that does not parse as a
/// valid date on either side yields `false` instead of an error.
pub fn is_overdue(due: &str, reference: &str) -> bool {
    match (due.parse::<DueDate>(), reference.parse::<DueDate>()) {
        (Ok(due), Ok(reference)) => due < reference,
        _ => false,
    }
}

/// Returns the local calendar date
pub fn today() -> Result<DueDate, DateError> {
    let now = chrono::Local::now().date_naive();
    from_calendar(now.year(), now.month(), now.day())
}

/// Builds a date from chrono's calendar components
fn from_calendar(year: i32, month: u32, day: u32) -> Result<DueDate, DateError> {
    let date = match (u16::try_from(year), u8::try_from(month), u8::try_from(day)) {
        (Ok(y), Ok(m), Ok(d)) => DueDate::new(y, m, d),
        _ => None,
    };
    date.ok_or_else(|| DateError::Impossible(format!("{:04}-{:02}-{:02}", year, month, day)))
}

/// A validated calendar date
///
/// Field order matters: the derived ordering compares year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DueDate {
    year: u16,
    month: u8,
    day: u8,
}

impl DueDate {
    /// Creates a date from its parts, `None` if the date does not exist
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        if is_valid_date(day.into(), month.into(), year.into()) {
            Some(Self { year, month, day })
        } else {
            None
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for DueDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(DateError::Malformed(s.to_string()));
        }

        let digits = |range: std::ops::Range<usize>| -> Result<u16, DateError> {
            let part = &s[range];
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DateError::Malformed(s.to_string()));
            }
            part.parse()
                .map_err(|_| DateError::Malformed(s.to_string()))
        };

        let year = digits(0..4)?;
        let month = digits(5..7)?;
        let day = digits(8..10)?;

        // month and day are two digits, so they always fit in u8
        Self::new(year, month as u8, day as u8).ok_or_else(|| DateError::Impossible(s.to_string()))
    }
}

impl TryFrom<String> for DueDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DueDate> for String {
    fn from(date: DueDate) -> Self {
        date.to_string()
    }
}
