//! Service week keys.
//!
//! A service week is an ISO-8601 year-week pair written as `YYYY-Www`. Day
//! records are grouped into week invoices by this key.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerError;

/// An ISO year-week identifier such as `2024-W23`.
///
/// Every constructor checks that the week exists in its ISO year, so the
/// week always has a Monday and a Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceWeek {
    year: i32,
    week: u32,
}

impl ServiceWeek {
    /// Creates a service week, returning `None` if the ISO year has no such week.
    pub fn new(year: i32, week: u32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(|_| Self { year, week })
    }

    /// Returns the service week containing `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pay_ledger::models::ServiceWeek;
    /// use chrono::NaiveDate;
    ///
    /// let week = ServiceWeek::from_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    /// assert_eq!(week.to_string(), "2024-W23");
    /// ```
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// The ISO year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The ISO week number (1-53).
    pub fn week(&self) -> u32 {
        self.week
    }

    /// The Monday that opens this week.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or(NaiveDate::MIN)
    }

    /// The Sunday that closes this week.
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Sun).unwrap_or(NaiveDate::MAX)
    }

    /// Checks whether `date` falls in this week.
    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for ServiceWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for ServiceWeek {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::invalid("service_week", format!("expected YYYY-Www, got '{}'", s));

        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;

        ServiceWeek::new(year, week).ok_or_else(invalid)
    }
}

impl Serialize for ServiceWeek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceWeek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
