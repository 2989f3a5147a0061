//! # Fashion ETL
//!
//! Scrapes product listings from a paginated fashion catalog, normalizes the
//! loosely formatted card text into typed rows, and loads the result into
//! one or more sinks.
//!
//! ## Usage
//!
//! ```sh
//! fashion_etl --start-page 1 --end-page 50 --output-csv products.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Extract**: Fetch each catalog page in order and pull raw fields out
//!    of every product card
//! 2. **Transform**: Parse prices, ratings, colour counts and labels into
//!    typed values, dropping invalid and duplicate rows
//! 3. **Load**: Write raw and clean CSVs, then optionally Postgres and
//!    Google Sheets
//!
//! Everything runs sequentially on a single thread.

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod transform;
mod utils;

use cli::Cli;
use config::{load_config, PipelineConfig};
use error::EtlError;
use models::Table;
use scrapers::catalog::scrape_products;
use scrapers::fetch::{FetchHtml, HttpFetcher};
use transform::transform_products;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    let args = Cli::parse();
    info!(start_page = args.start_page, end_page = args.end_page, "fashion_etl starting up");

    match run(&args).await {
        Ok(()) => {
            let elapsed = start_time.elapsed();
            info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            ExitCode::from(1)
        }
    }
}

async fn run(args: &Cli) -> Result<(), EtlError> {
    let config = apply_overrides(load_config(args.config.as_deref())?, args)?;
    let fetcher = HttpFetcher::from_config(&config)?;
    run_pipeline(&fetcher, args, &config).await
}

/// Let CLI flags win over the config file.
fn apply_overrides(mut config: PipelineConfig, args: &Cli) -> Result<PipelineConfig, EtlError> {
    if let Some(rate) = args.exchange_rate {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(EtlError::invalid(format!(
                "exchange rate must be a positive number, got {rate}"
            )));
        }
        config.exchange_rate = rate;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.delay_ms = delay_ms;
    }
    Ok(config)
}

/// Extract, transform and load one page range.
///
/// Fails when nothing at all was extracted, or when any sink fails.
#[instrument(level = "info", skip_all)]
async fn run_pipeline<F: FetchHtml>(
    fetcher: &F,
    args: &Cli,
    config: &PipelineConfig,
) -> Result<(), EtlError> {
    let rows = scrape_products(
        fetcher,
        &config.base_url,
        args.start_page,
        args.end_page,
        config.delay(),
    )
    .await?;
    if rows.is_empty() {
        return Err(EtlError::invalid("no data extracted"));
    }

    let raw = Table::from(rows);
    outputs::csv::save(&raw, &args.raw_csv)?;
    info!(path = %args.raw_csv.display(), rows = raw.len(), "Raw rows saved");

    let clean = transform_products(&raw, config.exchange_rate)?;
    info!(rows = clean.len(), "Clean rows ready");
    let clean = Table::from(clean.as_slice());

    outputs::csv::save(&clean, &args.output_csv)?;
    info!(path = %args.output_csv.display(), "Final CSV saved");

    if let Some(uri) = args.database_url.as_deref() {
        outputs::postgres::save(&clean, uri, &args.table_name).await?;
    }

    if let (Some(spreadsheet_id), Some(credentials)) =
        (args.spreadsheet_id.as_deref(), args.credentials.as_deref())
    {
        outputs::sheets::save(&clean, spreadsheet_id, &args.worksheet, credentials).await?;
    }

    Ok(())
}
