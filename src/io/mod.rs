//! Persisted tabular format: comma-separated text with a header line.

pub mod reader;
pub mod writer;

pub use reader::{ColumnIndex, SalesCsvReader, REQUIRED_COLUMNS};
pub use writer::{
    create_file, summary_to_csv_string, write_file_atomic, SalesCsvWriter, SummaryCsvWriter,
    SummarySink, SALES_HEADER, SUMMARY_HEADER,
};
