use crate::clock::{Clock, SystemClock};
use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
    All,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Parses a named period; unknown names mean `All`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "week" => Period::Week,
            "month" => Period::Month,
            "year" => Period::Year,
            _ => Period::All,
        }
    }
}

/// Resolves `period` against the local calendar day.
pub fn resolve_range(period: Period) -> DateRange {
    resolve_range_at(SystemClock.today(), period)
}

/// Custom bounds pass through untouched, even when `start > end`.
pub fn resolve_range_at(today: NaiveDate, period: Period) -> DateRange {
    match period {
        Period::Week => DateRange::new(today - Duration::days(7), today),
        Period::Month => DateRange::new(months_back(today, 1), today),
        Period::Year => DateRange::new(months_back(today, 12), today),
        Period::All => DateRange::new(epoch(), today),
        Period::Custom { start, end } => DateRange::new(start, end),
    }
}

fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(epoch())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}
