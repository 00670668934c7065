//! Sales record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregation::key::parse_date;
use crate::error::{Result, StatsError};

/// A typed sale as seen by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub id: i64,
    pub date: NaiveDate,
    pub value: f64,
}

impl Record {
    /// Build a record, rejecting non-finite values.
    pub fn new(id: i64, date: NaiveDate, value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(StatsError::InvalidValue {
                id: id.to_string(),
                column: "total",
                value: value.to_string(),
            });
        }
        Ok(Self { id, date, value })
    }
}

/// Untyped text of one persisted row, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub id: String,
    pub fecha: String,
    pub total: String,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, fecha: impl Into<String>, total: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fecha: fecha.into(),
            total: total.into(),
        }
    }

    /// Parse and validate every field. Nothing is defaulted.
    pub fn parse(&self) -> Result<Record> {
        let id_text = self.id.trim();
        let id = id_text
            .parse::<i64>()
            .map_err(|_| StatsError::InvalidValue {
                id: self.id.clone(),
                column: "id",
                value: self.id.clone(),
            })?;

        let date = parse_date(id_text, &self.fecha)?;

        let value = self
            .total
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| StatsError::InvalidValue {
                id: id_text.to_string(),
                column: "total",
                value: self.total.clone(),
            })?;

        Ok(Record { id, date, value })
    }
}

/// One generated sale with every persisted column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub order_id: u32,
    pub customer_id: u32,
    pub total: f64,
    #[serde(with = "fecha_format")]
    pub fecha: NaiveDate,
}

impl SaleRecord {
    /// The fields the aggregator consumes.
    pub fn record(&self) -> Record {
        Record {
            id: self.id,
            date: self.fecha,
            value: self.total,
        }
    }
}

/// `YYYY-MM-DD` text for the `fecha` column.
mod fecha_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(text.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
