//! Synthetic sales generator
//!
//! Produces random sales spread uniformly over a multi-year window. Ids are
//! supplied by the caller; the generator keeps no counter of its own.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::models::SaleRecord;

/// Largest generated `order_id`.
pub const MAX_ORDER_ID: u32 = 1_000_000;
/// Largest generated `customer_id`.
pub const MAX_CUSTOMER_ID: u32 = 100_000;
/// Totals are drawn as whole cents below this bound, i.e. `[0, 1000)`.
const TOTAL_CENTS_BOUND: u32 = 100_000;
/// Days are drawn from `1..=28` so every month is valid.
const MAX_DAY: u32 = 28;

/// Generates one [`SaleRecord`] per call.
pub struct SalesGenerator<R: Rng = ChaCha8Rng> {
    rng: R,
    epoch_year: i32,
    window_years: u32,
    window_start: NaiveDate,
}

impl SalesGenerator<ChaCha8Rng> {
    /// Seeded from `config.seed` when set, from entropy otherwise.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> SalesGenerator<R> {
    pub fn with_rng(config: &GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let window_start = NaiveDate::from_ymd_opt(config.epoch_year, 1, 1).ok_or_else(|| {
            crate::error::StatsError::Config(format!("invalid epoch year {}", config.epoch_year))
        })?;
        Ok(Self {
            rng,
            epoch_year: config.epoch_year,
            window_years: config.window_years,
            window_start,
        })
    }

    /// First day of the generation window.
    pub fn window_start(&self) -> NaiveDate {
        self.window_start
    }

    /// Last possible generated date.
    pub fn window_end(&self) -> NaiveDate {
        let last_year = self.epoch_year + self.window_years as i32 - 1;
        NaiveDate::from_ymd_opt(last_year, 12, MAX_DAY).unwrap_or(self.window_start)
    }

    pub fn generate(&mut self, id: i64) -> SaleRecord {
        let order_id = self.rng.gen_range(1..=MAX_ORDER_ID);
        let customer_id = self.rng.gen_range(1..=MAX_CUSTOMER_ID);
        let cents = self.rng.gen_range(0..TOTAL_CENTS_BOUND);
        let total = cents as f64 / 100.0;

        let year = self.epoch_year + self.rng.gen_range(0..self.window_years) as i32;
        let month0 = self.rng.gen_range(0..12u32);
        let day = self.rng.gen_range(1..=MAX_DAY);
        // Validated window and day <= 28: always a real date.
        let fecha = NaiveDate::from_ymd_opt(year, month0 + 1, day).unwrap_or(self.window_start);

        SaleRecord {
            id,
            order_id,
            customer_id,
            total,
            fecha,
        }
    }

    /// Records with ids `1..=count`.
    pub fn records(&mut self, count: u64) -> impl Iterator<Item = SaleRecord> + '_ {
        (1..=count).map(move |id| self.generate(id as i64))
    }
}
