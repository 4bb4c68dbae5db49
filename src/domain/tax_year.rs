//! UK tax years, 6 April to 5 April.

use crate::domain::TimeMs;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A UK tax year identified by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxYear {
    pub start_year: i32,
}

impl TaxYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// The tax year an instant falls in.
    pub fn containing(time: TimeMs) -> Option<Self> {
        let date = time.utc_date()?;
        let starts_this_year = NaiveDate::from_ymd_opt(date.year(), 4, 6)?;
        if date >= starts_this_year {
            Some(Self::new(date.year()))
        } else {
            Some(Self::new(date.year() - 1))
        }
    }

    /// First instant of the year (6 April, 00:00 UTC).
    pub fn start(&self) -> Option<TimeMs> {
        TimeMs::from_ymd_hms(self.start_year, 4, 6, 0, 0, 0)
    }

    /// First instant of the following year; the year is `[start, end)`.
    pub fn end_exclusive(&self) -> Option<TimeMs> {
        TimeMs::from_ymd_hms(self.start_year + 1, 4, 6, 0, 0, 0)
    }

    pub fn contains(&self, time: TimeMs) -> bool {
        match (self.start(), self.end_exclusive()) {
            (Some(start), Some(end)) => time >= start && time < end,
            _ => false,
        }
    }

    /// e.g. "2022-2023".
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_year, self.start_year + 1)
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
