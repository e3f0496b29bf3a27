//! Month scope for transaction pulls.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// A calendar month, written `YYYY-MM` on the wire and in the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthFilter {
    year: i32,
    month: u8,
}

impl MonthFilter {
    /// Creates a month filter, rejecting months outside 1-12.
    pub fn new(year: i32, month: u8) -> ModelResult<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(ModelError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            year: now.year(),
            month: u8::from(now.month()),
        }
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number (1-12).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Returns true if the `YYYY-MM-DD` date falls in this month.
    pub fn contains(&self, date: &str) -> bool {
        let prefix = self.to_string();
        date.len() > prefix.len()
            && date.starts_with(&prefix)
            && date.as_bytes()[prefix.len()] == b'-'
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthFilter {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthFilter> for String {
    fn from(value: MonthFilter) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let month: MonthFilter = "2025-01".parse().unwrap();
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 1);
        assert_eq!(month.to_string(), "2025-01");
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["2025-13", "2025-00", "2025-1", "25-01", "2025/01", "", "abcd-ef"] {
            assert!(bad.parse::<MonthFilter>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn contains_matches_dates_in_month() {
        let month = MonthFilter::new(2025, 1).unwrap();
        assert!(month.contains("2025-01-15"));
        assert!(!month.contains("2025-02-01"));
        assert!(!month.contains("2025-01"));
        assert!(!month.contains("2025-011-01"));
    }

    #[test]
    fn serde_uses_string_form() {
        let month = MonthFilter::new(2024, 11).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2024-11\"");
        let back: MonthFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
        assert!(serde_json::from_str::<MonthFilter>("\"2024-99\"").is_err());
    }
}
