//! Ventas Stats Library
//!
//! Synthetic sales generation and single-pass monthly statistics.
//! The `ventas` binary and the HTTP adapter are thin layers over these
//! modules.

pub mod aggregation;
pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod io;
pub mod models;
pub mod pipeline;

pub use aggregation::{GroupKey, MonthlyAggregator, SummaryRow, VariancePolicy};
pub use error::StatsError;
