//! Error taxonomy for ingestion, aggregation and output.
//!
//! Every variant is fatal for the run that produced it: nothing is skipped,
//! and callers surface the error with the record id or column name attached.

use std::fmt;

/// Errors produced while reading, aggregating or writing sales statistics.
#[derive(Debug)]
pub enum StatsError {
    /// Date text that is malformed or names an impossible calendar date.
    InvalidDate { id: String, value: String },
    /// Numeric field that is not a number, or not finite.
    InvalidValue {
        id: String,
        column: &'static str,
        value: String,
    },
    /// Table header lacks required columns.
    Schema { missing: Vec<String> },
    /// Table without a header or without data rows.
    EmptyInput,
    /// Invalid configuration value.
    Config(String),
    /// Malformed CSV (e.g. a row with the wrong number of fields).
    Csv(csv::Error),
    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl StatsError {
    /// True for errors caused by the data or configuration rather than the
    /// environment. The CLI maps these to exit code 2.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate { .. }
                | Self::InvalidValue { .. }
                | Self::Schema { .. }
                | Self::EmptyInput
                | Self::Config(_)
        )
    }
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate { id, value } => {
                write!(f, "invalid date in record with id {}: {:?}", id, value)
            }
            Self::InvalidValue { id, column, value } => {
                write!(
                    f,
                    "invalid value for column '{}' in record with id {}: {:?}",
                    column, id, value
                )
            }
            Self::Schema { missing } => {
                write!(f, "missing required columns: {}", missing.join(", "))
            }
            Self::EmptyInput => write!(f, "input table has no data rows"),
            Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Csv(e) => write!(f, "csv error: {}", e),
            Self::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for StatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for StatsError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<std::io::Error> for StatsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
