//! Streaming reader over persisted sales tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, StatsError};
use crate::models::{RawRecord, Record};

/// Columns a sales table must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 3] = ["id", "fecha", "total"];

/// Positions of the required columns in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub id: usize,
    pub fecha: usize,
    pub total: usize,
}

impl ColumnIndex {
    /// Match header names case-insensitively, ignoring surrounding spaces.
    pub fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(c)).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        match positions.as_slice() {
            [Some(id), Some(fecha), Some(total)] => Ok(Self {
                id: *id,
                fecha: *fecha,
                total: *total,
            }),
            _ => Err(StatsError::Schema { missing }),
        }
    }
}

/// Reads sales rows one at a time and yields validated [`Record`]s.
///
/// Only one row is held in memory at a time.
pub struct SalesCsvReader<R: Read> {
    reader: csv::Reader<R>,
    columns: ColumnIndex,
    row: csv::StringRecord,
    rows_read: u64,
}

impl SalesCsvReader<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

impl<R: Read> SalesCsvReader<R> {
    /// Read and check the header line.
    ///
    /// Fails with `EmptyInput` when there is no header at all and with
    /// `Schema` when required columns are missing.
    pub fn new(inner: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(inner);

        let headers = reader.headers()?.clone();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(StatsError::EmptyInput);
        }
        let columns = ColumnIndex::resolve(&headers)?;

        Ok(Self {
            reader,
            columns,
            row: csv::StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn columns(&self) -> ColumnIndex {
        self.columns
    }

    /// Data rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Next row as untyped text, without validation.
    pub fn next_raw(&mut self) -> Option<Result<RawRecord>> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => None,
            Ok(true) => {
                self.rows_read += 1;
                let field = |i: usize| self.row.get(i).unwrap_or_default().to_string();
                Some(Ok(RawRecord {
                    id: field(self.columns.id),
                    fecha: field(self.columns.fecha),
                    total: field(self.columns.total),
                }))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl<R: Read> Iterator for SalesCsvReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_raw().map(|raw| raw.and_then(|r| r.parse()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> Result<SalesCsvReader<&[u8]>> {
        SalesCsvReader::new(text.as_bytes())
    }

    #[test]
    fn test_reads_generated_layout() {
        let text = "id,order_id,customer_id,total,fecha\n\
                    1,10,20,10,2020-01-15\n\
                    2,11,21,20.5,2020-01-20\n";
        let records: Vec<Record> = reader(text).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].value, 20.5);
        assert_eq!(records[1].date.to_string(), "2020-01-20");
    }

    #[test]
    fn test_headers_case_and_space_insensitive() {
        let text = " Total , FECHA,Id\n5, 2020-02-01 ,3\n";
        let mut rdr = reader(text).unwrap();
        assert_eq!(
            rdr.columns(),
            ColumnIndex {
                id: 2,
                fecha: 1,
                total: 0
            }
        );
        let record = rdr.next().unwrap().unwrap();
        assert_eq!(record.id, 3);
        assert_eq!(record.value, 5.0);
    }

    #[test]
    fn test_missing_columns_listed() {
        match reader("id,amount\n1,2\n") {
            Err(StatsError::Schema { missing }) => assert_eq!(missing, vec!["fecha", "total"]),
            other => panic!("expected Schema error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(reader(""), Err(StatsError::EmptyInput)));
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let mut rdr = reader("id,fecha,total\n").unwrap();
        assert!(rdr.next().is_none());
        assert_eq!(rdr.rows_read(), 0);
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let mut rdr = reader("id,fecha,total\n1,2020-01-01\n").unwrap();
        assert!(matches!(rdr.next(), Some(Err(StatsError::Csv(_)))));
    }

    #[test]
    fn test_invalid_date_surfaces_with_id() {
        let mut rdr = reader("id,fecha,total\n4,not-a-date,1\n").unwrap();
        match rdr.next() {
            Some(Err(StatsError::InvalidDate { id, .. })) => assert_eq!(id, "4"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
