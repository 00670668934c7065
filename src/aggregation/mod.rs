//! Monthly sales statistics computed in a single pass.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ventas_stats::aggregation::{MonthlyAggregator, VariancePolicy};
//! use ventas_stats::models::Record;
//!
//! let mut agg = MonthlyAggregator::new(VariancePolicy::Clamp);
//! for (id, day, total) in [(1, 15, 10.0), (2, 20, 20.0)] {
//!     let date = NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
//!     agg.observe(&Record::new(id, date, total).unwrap()).unwrap();
//! }
//!
//! let rows = agg.finalize();
//! assert_eq!(rows[0].key.to_string(), "2020-01");
//! assert_eq!(rows[0].mean.as_str(), "15.00");
//! assert_eq!(rows[0].std_dev.as_str(), "5.00");
//! ```

pub mod accumulator;
pub mod aggregator;
pub mod key;
pub mod rounding;

pub use accumulator::{GroupAccumulator, VariancePolicy};
pub use aggregator::{MonthlyAggregator, SummaryRecord, SummaryRow};
pub use key::GroupKey;
pub use rounding::Fixed2;
