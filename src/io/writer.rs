//! CSV sinks for generated sales and monthly statistics.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::aggregation::SummaryRow;
use crate::error::{Result, StatsError};
use crate::models::SaleRecord;

/// Header of the statistics table.
///
/// Logical order: key, count, max, min, mean, standard deviation.
pub const SUMMARY_HEADER: [&str; 6] = [
    "year_month",
    "num_ventas",
    "maximo",
    "minimo",
    "media",
    "desviacion_tipica",
];

/// Header of the generated sales table.
pub const SALES_HEADER: [&str; 5] = ["id", "order_id", "customer_id", "total", "fecha"];

/// Consumes finalized rows in the order given.
pub trait SummarySink {
    fn write_summary(&mut self, rows: &[SummaryRow]) -> Result<()>;
}

/// Writes monthly statistics as CSV.
///
/// `media` and `desviacion_tipica` are written from their rounded text, never
/// re-formatted.
pub struct SummaryCsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryCsvWriter<W> {
    /// Wrap `inner` and write the header line.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(SUMMARY_HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_row(&mut self, row: &SummaryRow) -> Result<()> {
        self.writer.write_record([
            row.key.to_string(),
            row.count.to_string(),
            row.max.to_string(),
            row.min.to_string(),
            row.mean.to_string(),
            row.std_dev.to_string(),
        ])?;
        Ok(())
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| StatsError::Io(std::io::Error::new(e.error().kind(), e.to_string())))
    }
}

impl<W: Write> SummarySink for SummaryCsvWriter<W> {
    fn write_summary(&mut self, rows: &[SummaryRow]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Render rows as an in-memory CSV table.
pub fn summary_to_csv_string(rows: &[SummaryRow]) -> Result<String> {
    let mut sink = SummaryCsvWriter::new(Vec::new())?;
    sink.write_summary(rows)?;
    let bytes = sink.into_inner()?;
    String::from_utf8(bytes)
        .map_err(|e| StatsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Writes generated sales with columns `id,order_id,customer_id,total,fecha`.
///
/// The header is written up front, so a table with no records still has it.
pub struct SalesCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    written: u64,
}

impl SalesCsvWriter<File> {
    /// Create `path`, and its parent directories if needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        Self::new(file)
    }
}

impl<W: Write> SalesCsvWriter<W> {
    /// Wrap `inner` and write the header line.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(SALES_HEADER)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, record: &SaleRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Create a file, making missing parent directories first.
pub fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Write `path` through a sibling `.partial` file that is renamed into place
/// only after `write` succeeds. On failure neither file is left behind.
pub fn write_file_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let partial = partial_path(path);
    let file = create_file(&partial)?;
    let result = write(file).and_then(|()| Ok(fs::rename(&partial, path)?));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{Fixed2, GroupKey};
    use chrono::NaiveDate;

    fn row(year: i32, month: u32, count: u64, min: f64, max: f64, mean: f64, sd: f64) -> SummaryRow {
        SummaryRow {
            key: GroupKey::new(year, month).unwrap(),
            count,
            min,
            max,
            mean: Fixed2::round(mean),
            std_dev: Fixed2::round(sd),
        }
    }

    #[test]
    fn test_summary_table_layout() {
        let rows = vec![
            row(2020, 1, 2, 10.0, 20.0, 15.0, 5.0),
            row(2020, 2, 1, 5.0, 5.0, 5.0, 0.0),
        ];
        let text = summary_to_csv_string(&rows).unwrap();
        assert_eq!(
            text,
            "year_month,num_ventas,maximo,minimo,media,desviacion_tipica\n\
             2020-01,2,20,10,15.00,5.00\n\
             2020-02,1,5,5,5.00,0.00\n"
        );
    }

    #[test]
    fn test_fractional_extrema_keep_shortest_form() {
        let rows = vec![row(2021, 12, 3, 0.5, 999.99, 400.123, 12.345678)];
        let text = summary_to_csv_string(&rows).unwrap();
        assert!(text.ends_with("2021-12,3,999.99,0.5,400.12,12.35\n"));
    }

    #[test]
    fn test_empty_summary_is_header_only() {
        let text = summary_to_csv_string(&[]).unwrap();
        assert_eq!(text, "year_month,num_ventas,maximo,minimo,media,desviacion_tipica\n");
    }

    #[test]
    fn test_sales_writer_header_and_date_format() {
        let mut writer = SalesCsvWriter::new(Vec::new()).unwrap();
        writer
            .write(&SaleRecord {
                id: 1,
                order_id: 500,
                customer_id: 9,
                total: 12.5,
                fecha: NaiveDate::from_ymd_opt(2023, 7, 4).unwrap(),
            })
            .unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.written(), 1);

        let bytes = match writer.writer.into_inner() {
            Ok(bytes) => bytes,
            Err(e) => panic!("flush failed: {}", e.error()),
        };
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,order_id,customer_id,total,fecha"));
        assert_eq!(lines.next(), Some("1,500,9,12.5,2023-07-04"));
    }

    #[test]
    fn test_sales_writer_without_records_has_header() {
        let mut writer = SalesCsvWriter::new(Vec::new()).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.written(), 0);

        let bytes = match writer.writer.into_inner() {
            Ok(bytes) => bytes,
            Err(e) => panic!("flush failed: {}", e.error()),
        };
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,order_id,customer_id,total,fecha\n"
        );
    }

    #[test]
    fn test_atomic_write_renames_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        write_file_atomic(&path, |mut file| {
            file.write_all(b"year_month\n")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "year_month\n");
        assert!(!dir.path().join("stats.csv.partial").exists());
    }

    #[test]
    fn test_atomic_write_failure_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let err = write_file_atomic(&path, |mut file| {
            file.write_all(b"year_month,num_ventas\n2020-01,")?;
            Err(StatsError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "disk full",
            )))
        })
        .unwrap_err();

        assert!(matches!(err, StatsError::Io(_)));
        assert!(!path.exists());
        assert!(!dir.path().join("stats.csv.partial").exists());
    }

    #[test]
    fn test_create_file_makes_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        create_file(&path).unwrap();
        assert!(path.exists());
    }
}
