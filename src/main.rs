//! Ventas - synthetic sales generator and monthly statistics
//!
//! # Usage
//!
//! ```bash
//! # Generate 1M sales into data/ventas.csv, then aggregate them into
//! # data/estadisticas_ventas.csv
//! cargo run --release -- run
//!
//! cargo run --release -- generate --records 50000 --seed 42 --output data/ventas.csv
//! cargo run --release -- process --input data/ejemplo_ventas.csv --output data/ejemplo_estadisticas.csv --print
//! cargo run --release -- serve --bind 127.0.0.1:3000
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 2: Configuration or data validation error
//! - 3: Runtime error (I/O, malformed CSV, server)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ventas_stats::api::{self, ApiState};
use ventas_stats::config::VentasConfig;
use ventas_stats::pipeline::{generate_to_path, process_path, run_batch};
use ventas_stats::{StatsError, VariancePolicy};

/// Synthetic sales generator and monthly statistics
#[derive(Parser, Debug)]
#[command(name = "ventas")]
#[command(about = "Generate synthetic sales and compute monthly statistics")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "VENTAS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate sales, then aggregate them into monthly statistics
    Run {
        /// Number of records to generate
        #[arg(short = 'n', long)]
        records: Option<u64>,

        /// Generated sales table
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Statistics table
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible generation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate a synthetic sales table
    Generate {
        /// Number of records to generate
        #[arg(short = 'n', long)]
        records: Option<u64>,

        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible generation
        #[arg(long)]
        seed: Option<u64>,

        /// First year of the date window
        #[arg(long)]
        epoch_year: Option<i32>,
    },

    /// Aggregate a sales table into monthly statistics
    Process {
        /// Sales table to read
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Statistics table to write
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also list every row on stdout
        #[arg(short, long)]
        print: bool,

        /// How to handle a negative computed variance (clamp | propagate)
        #[arg(long)]
        variance_policy: Option<VariancePolicy>,
    },

    /// Serve the statistics HTTP API
    Serve {
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,

        /// How to handle a negative computed variance (clamp | propagate)
        #[arg(long)]
        variance_policy: Option<VariancePolicy>,
    },
}

fn main() -> ExitCode {
    let _ = dotenv();
    init_tracing();

    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ventas_stats=info,ventas=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StatsError>() {
        Some(e) if e.is_validation() => 2,
        _ => 3,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<VentasConfig> {
    let config = VentasConfig::resolve(path.map(PathBuf::as_path))
        .map_err(|e| StatsError::Config(format!("{:#}", e)))?;
    Ok(config)
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run {
            records,
            input,
            output,
            seed,
        } => {
            if let Some(records) = records {
                config.generate.records = records;
            }
            if let Some(input) = input {
                config.paths.input = input;
            }
            if let Some(output) = output {
                config.paths.output = output;
            }
            if seed.is_some() {
                config.generate.seed = seed;
            }

            let report = run_batch(&config).context("Batch run failed")?;
            println!(
                "Generated {} records into {}",
                report.generated,
                report.input.display()
            );
            println!(
                "Wrote {} monthly rows ({} records) into {}",
                report.summary.total_periods(),
                report.summary.total_records,
                report.output.display()
            );
        }

        Commands::Generate {
            records,
            output,
            seed,
            epoch_year,
        } => {
            if let Some(seed) = seed {
                config.generate.seed = Some(seed);
            }
            if let Some(epoch_year) = epoch_year {
                config.generate.epoch_year = epoch_year;
            }
            let count = records.unwrap_or(config.generate.records);
            let output = output.unwrap_or(config.paths.input);

            info!(records = count, "Generating CSV with random data...");
            let written = generate_to_path(&config.generate, count, &output)
                .with_context(|| format!("Failed to generate {}", output.display()))?;
            println!("Generated {} records into {}", written, output.display());
        }

        Commands::Process {
            input,
            output,
            print,
            variance_policy,
        } => {
            let input = input.unwrap_or(config.paths.input);
            let output = output.unwrap_or(config.paths.output);
            let policy = variance_policy.unwrap_or(config.process.variance_policy);

            let report = process_path(&input, &output, policy)
                .with_context(|| format!("Failed to process {}", input.display()))?;

            if print {
                println!("Results:");
                for row in &report.rows {
                    println!("{}", row);
                }
            }
        }

        Commands::Serve {
            bind,
            variance_policy,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(policy) = variance_policy {
                config.process.variance_policy = policy;
            }
            config.validate()?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build tokio runtime")?;
            runtime.block_on(serve(config))?;
        }
    }

    Ok(())
}

async fn serve(config: VentasConfig) -> Result<()> {
    let state = Arc::new(ApiState {
        policy: config.process.variance_policy,
    });
    let app = api::app(state, config.server.max_upload_bytes);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Statistics API listening on {}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
