//! Streaming monthly aggregation.
//!
//! Records are observed one at a time and folded into a per-month
//! [`GroupAccumulator`]. Nothing but the accumulators is retained, so memory
//! grows with the number of distinct months, not with the number of records.
//!
//! ```text
//! mean     = sum / count
//! variance = sum_sq / count - mean²      (population, computational formula)
//! std_dev  = sqrt(variance)              (negative variance per VariancePolicy)
//! ```
//!
//! `mean` and `std_dev` are rounded to two decimals at finalization and the
//! rounded text is the canonical output.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::accumulator::{GroupAccumulator, VariancePolicy};
use super::key::GroupKey;
use super::rounding::Fixed2;
use crate::error::{Result, StatsError};
use crate::models::{RawRecord, Record};

/// Finalized statistics for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: GroupKey,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: Fixed2,
    pub std_dev: Fixed2,
}

impl SummaryRow {
    fn from_accumulator(key: GroupKey, acc: &GroupAccumulator, policy: VariancePolicy) -> Self {
        Self {
            key,
            count: acc.count(),
            min: acc.min(),
            max: acc.max(),
            mean: Fixed2::round(acc.mean()),
            std_dev: Fixed2::round(acc.std_dev(policy)),
        }
    }
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Ventas={}, Max={}, Min={}, Media={}, StdDev={}",
            self.key, self.count, self.max, self.min, self.mean, self.std_dev
        )
    }
}

/// Serialized shape of a row, using the persisted column names.
#[derive(Debug, Serialize)]
pub struct SummaryRecord<'a> {
    pub year_month: GroupKey,
    pub num_ventas: u64,
    pub maximo: f64,
    pub minimo: f64,
    pub media: &'a Fixed2,
    pub desviacion_tipica: &'a Fixed2,
}

impl<'a> From<&'a SummaryRow> for SummaryRecord<'a> {
    fn from(row: &'a SummaryRow) -> Self {
        Self {
            year_month: row.key,
            num_ventas: row.count,
            maximo: row.max,
            minimo: row.min,
            media: &row.mean,
            desviacion_tipica: &row.std_dev,
        }
    }
}

impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SummaryRecord::from(self).serialize(serializer)
    }
}

/// Owns every accumulator of one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct MonthlyAggregator {
    groups: BTreeMap<GroupKey, GroupAccumulator>,
    policy: VariancePolicy,
    records_observed: u64,
}

impl MonthlyAggregator {
    pub fn new(policy: VariancePolicy) -> Self {
        Self {
            groups: BTreeMap::new(),
            policy,
            records_observed: 0,
        }
    }

    pub fn policy(&self) -> VariancePolicy {
        self.policy
    }

    /// Fold one record into its month.
    ///
    /// State is untouched when the record is rejected.
    pub fn observe(&mut self, record: &Record) -> Result<()> {
        if !record.value.is_finite() {
            return Err(StatsError::InvalidValue {
                id: record.id.to_string(),
                column: "total",
                value: record.value.to_string(),
            });
        }
        let key = GroupKey::from_date(record.date).ok_or_else(|| StatsError::InvalidDate {
            id: record.id.to_string(),
            value: record.date.to_string(),
        })?;

        self.groups.entry(key).or_default().add(record.value);
        self.records_observed += 1;
        Ok(())
    }

    /// Validate a persisted row and fold it in.
    pub fn observe_raw(&mut self, raw: &RawRecord) -> Result<()> {
        let record = raw.parse()?;
        self.observe(&record)
    }

    /// One row per observed month, ascending by key.
    ///
    /// Does not mutate state; repeated calls return equal rows.
    pub fn finalize(&self) -> Vec<SummaryRow> {
        self.groups
            .iter()
            .map(|(key, acc)| SummaryRow::from_accumulator(*key, acc, self.policy))
            .collect()
    }

    pub fn records_observed(&self) -> u64 {
        self.records_observed
    }

    pub fn distinct_keys(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records_observed == 0
    }

    /// Accumulator for `key`, if any record fell into it.
    pub fn group(&self, key: &GroupKey) -> Option<&GroupAccumulator> {
        self.groups.get(key)
    }
}
