//! Year-month grouping keys.

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{Result, StatsError};

/// Largest year whose key still renders with four digits.
pub const MAX_KEY_YEAR: i32 = 9999;

/// Calendar month bucket, rendered as `YYYY-MM`.
///
/// Years are limited to `0..=9999`, so the derived `Ord` on `(year, month)`
/// matches lexicographic order of the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    year: i32,
    month: u32,
}

impl GroupKey {
    /// Build a key from explicit components. `month` is 1-based.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (0..=MAX_KEY_YEAR).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Key for the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Parse raw date text and derive its key.
    ///
    /// `id` is only used to label the error.
    pub fn derive(id: &str, raw: &str) -> Result<Self> {
        let date = parse_date(id, raw)?;
        Self::from_date(date).ok_or_else(|| invalid_date(id, raw))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a sale date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps; a timestamp contributes the
/// calendar date in its own offset.
pub fn parse_date(id: &str, raw: &str) -> Result<NaiveDate> {
    let text = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.date_naive())
        .map_err(|_| invalid_date(id, raw))
}

fn invalid_date(id: &str, raw: &str) -> StatsError {
    StatsError::InvalidDate {
        id: id.to_string(),
        value: raw.to_string(),
    }
}
