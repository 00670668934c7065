//! Batch pipeline: generate a sales table, then aggregate it into monthly
//! statistics.
//!
//! Every stage stops at the first error. The statistics file is only created
//! after the whole input has been aggregated, and is written under a
//! temporary name until complete, so a failed run leaves no output table
//! behind.

use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::aggregation::{MonthlyAggregator, SummaryRow, VariancePolicy};
use crate::config::{GeneratorConfig, VentasConfig};
use crate::error::{Result, StatsError};
use crate::generator::SalesGenerator;
use crate::io::{write_file_atomic, SalesCsvReader, SalesCsvWriter, SummaryCsvWriter, SummarySink};
use crate::models::Record;

/// Outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Data rows consumed.
    pub total_records: u64,
    /// One row per month, ascending.
    pub rows: Vec<SummaryRow>,
}

impl AggregateReport {
    /// Distinct months in the input.
    pub fn total_periods(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of a full generate + process run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub generated: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: AggregateReport,
}

/// Write `count` generated sales to `path`, logging progress every
/// `config.progress_interval` records.
pub fn generate_to_path(config: &GeneratorConfig, count: u64, path: &Path) -> Result<u64> {
    let mut generator = SalesGenerator::from_config(config)?;
    let mut writer = SalesCsvWriter::create(path)?;

    for record in generator.records(count) {
        writer.write(&record)?;
        let written = writer.written();
        if config.progress_interval > 0 && written % config.progress_interval == 0 {
            info!(generated = written, "Generated {} records...", written);
        }
    }
    writer.flush()?;

    info!(records = writer.written(), path = %path.display(), "CSV generated");
    Ok(writer.written())
}

/// Fold a record stream into a fresh aggregator.
///
/// Fails with `EmptyInput` when the stream yields nothing.
pub fn aggregate_records<I>(records: I, policy: VariancePolicy) -> Result<MonthlyAggregator>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut aggregator = MonthlyAggregator::new(policy);
    for record in records {
        aggregator.observe(&record?)?;
    }
    if aggregator.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    debug!(
        records = aggregator.records_observed(),
        periods = aggregator.distinct_keys(),
        "Aggregation complete"
    );
    Ok(aggregator)
}

/// Aggregate a CSV sales table read from `input`.
pub fn aggregate_csv<R: Read>(input: R, policy: VariancePolicy) -> Result<AggregateReport> {
    let reader = SalesCsvReader::new(input)?;
    let aggregator = aggregate_records(reader, policy)?;
    Ok(AggregateReport {
        total_records: aggregator.records_observed(),
        rows: aggregator.finalize(),
    })
}

/// Aggregate the table at `input` and write the statistics to `output`.
pub fn process_path(input: &Path, output: &Path, policy: VariancePolicy) -> Result<AggregateReport> {
    info!(input = %input.display(), "Processing CSV...");
    let reader = SalesCsvReader::from_path(input)?;
    let aggregator = aggregate_records(reader, policy)?;
    let rows = aggregator.finalize();

    write_file_atomic(output, |file| {
        let mut sink = SummaryCsvWriter::new(file)?;
        sink.write_summary(&rows)
    })?;

    info!(
        output = %output.display(),
        periods = rows.len(),
        records = aggregator.records_observed(),
        "CSV processed"
    );
    Ok(AggregateReport {
        total_records: aggregator.records_observed(),
        rows,
    })
}

/// Generate `config.generate.records` sales to the input path, then process
/// them into the output path.
pub fn run_batch(config: &VentasConfig) -> Result<BatchReport> {
    config.validate()?;
    let input = config.paths.input.clone();
    let output = config.paths.output.clone();

    info!(records = config.generate.records, "Generating CSV with random data...");
    let generated = generate_to_path(&config.generate, config.generate.records, &input)?;

    let summary = process_path(&input, &output, config.process.variance_policy)?;

    Ok(BatchReport {
        generated,
        input,
        output,
        summary,
    })
}
