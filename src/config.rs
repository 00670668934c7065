//! Runtime configuration
//!
//! Loaded from a TOML file; every section and field has a default, so an
//! absent file or a partial one is fine. CLI flags override file values.
//!
//! ```toml
//! [generate]
//! records = 1000000
//! epoch_year = 2020
//! seed = 42
//!
//! [process]
//! variance_policy = "clamp"
//!
//! [paths]
//! input = "data/ventas.csv"
//! output = "data/estadisticas_ventas.csv"
//!
//! [server]
//! bind = "0.0.0.0:3000"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregation::key::MAX_KEY_YEAR;
use crate::aggregation::VariancePolicy;
use crate::error::StatsError;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "VENTAS_CONFIG";
/// Config file looked up when neither flag nor env var is set.
pub const DEFAULT_CONFIG_PATH: &str = "ventas.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VentasConfig {
    #[serde(default)]
    pub generate: GeneratorConfig,

    #[serde(default)]
    pub process: ProcessConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl VentasConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the config file and load it.
    ///
    /// An explicit path must exist. Otherwise `VENTAS_CONFIG` or
    /// `ventas.toml` is used when present, and defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("Using default config ({} not found)", path.display());
            Ok(Self::default())
        }
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        self.generate.validate()?;
        if self.server.max_upload_bytes == 0 {
            return Err(StatsError::Config(
                "server.max_upload_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Synthetic sales generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of records written by `generate`/`run`
    #[serde(default = "default_records")]
    pub records: u64,

    /// First year of the date window
    #[serde(default = "default_epoch_year")]
    pub epoch_year: i32,

    /// Width of the date window in years
    #[serde(default = "default_window_years")]
    pub window_years: u32,

    /// Fixed seed for reproducible output; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Log progress every N records (0 disables)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_records() -> u64 {
    1_000_000
}
fn default_epoch_year() -> i32 {
    2020
}
fn default_window_years() -> u32 {
    5
}
fn default_progress_interval() -> u64 {
    10_000
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            records: default_records(),
            epoch_year: default_epoch_year(),
            window_years: default_window_years(),
            seed: None,
            progress_interval: default_progress_interval(),
        }
    }
}

impl GeneratorConfig {
    /// Last year a generated date can fall in.
    pub fn last_year(&self) -> i64 {
        self.epoch_year as i64 + self.window_years as i64 - 1
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        if self.window_years == 0 {
            return Err(StatsError::Config(
                "generate.window_years must be at least 1".to_string(),
            ));
        }
        if self.epoch_year < 0 || self.last_year() > MAX_KEY_YEAR as i64 {
            return Err(StatsError::Config(format!(
                "generate window {}..={} must lie within 0..={}",
                self.epoch_year,
                self.last_year(),
                MAX_KEY_YEAR
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default)]
    pub variance_policy: VariancePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Generated sales table
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Monthly statistics table
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("data/ventas.csv")
}
fn default_output() -> PathBuf {
    PathBuf::from("data/estadisticas_ventas.csv")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}
