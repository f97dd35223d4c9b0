#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the emigrant statistics toolchain.
//!
//! Uploads category CSVs into the record store, prints category views and
//! forecasts as JSON, and starts the API server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emigrant_stats_category::{all_categories, definition};
use emigrant_stats_category_models::Category;
use emigrant_stats_dashboard::{load_category, prediction_dashboard};
use emigrant_stats_ingest::ingest_file;
use emigrant_stats_prediction::{PredictionClient, PredictionService, YearsAhead};
use emigrant_stats_store::{RecordStore, open_from_env};
use emigrant_stats_transform::{ParsePolicy, YearFilter};

#[derive(Parser)]
#[command(name = "emigrant_stats", about = "Philippine emigrant statistics toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every category and its upload requirements
    Categories,
    /// Upload a category CSV into the record store
    Ingest {
        /// Category identifier (e.g., "`civil_status`")
        category: Category,
        /// Path to the CSV file
        file: PathBuf,
        /// Reject the file if any cell is not a whole number
        #[arg(long)]
        strict: bool,
    },
    /// Upload every `<category>.csv` found in a directory
    IngestDir {
        /// Directory holding the CSV files
        dir: PathBuf,
        /// Reject files with cells that are not whole numbers
        #[arg(long)]
        strict: bool,
    },
    /// Print the chart-ready view of a category as JSON
    Show {
        /// Category identifier
        category: Category,
        /// "all" or a single year for the map and ranking views
        #[arg(long, default_value = "all")]
        year: YearFilter,
    },
    /// Delete every stored record of a category
    Clear {
        /// Category identifier
        category: Category,
    },
    /// Forecast every forecast category and print the charts as JSON
    Predict {
        /// Number of years to forecast (1-10)
        #[arg(long, default_value = "5")]
        years_ahead: u32,
    },
    /// Print model information from the forecasting service
    Models,
    /// Start the API server
    Serve,
}

const fn policy(strict: bool) -> ParsePolicy {
    if strict {
        ParsePolicy::Strict
    } else {
        ParsePolicy::Permissive
    }
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Categories => {
            println!("{:<20} {:<15} LABEL", "ID", "LAYOUT");
            println!("{}", "-".repeat(60));
            for def in all_categories() {
                let layout = format!("{:?}", def.layout);
                println!("{:<20} {layout:<15} {}", def.id, def.label);
                for requirement in &def.requirements {
                    println!("{:<36} - {requirement}", "");
                }
            }
        }
        Commands::Ingest {
            category,
            file,
            strict,
        } => {
            let store = open_from_env();
            let def = definition(category);
            let report = ingest_file(&store, &def, &file, policy(strict)).await?;
            println!("{}", report.message());
        }
        Commands::IngestDir { dir, strict } => {
            let store = open_from_env();
            let mut failures = 0usize;
            for def in all_categories() {
                let path = dir.join(format!("{}.csv", def.id));
                if !path.exists() {
                    log::info!("{}: no {} found, skipping", def.id, path.display());
                    continue;
                }
                match ingest_file(&store, &def, &path, policy(strict)).await {
                    Ok(report) => println!("{:<20} {}", def.id, report.message()),
                    Err(e) => {
                        failures += 1;
                        log::error!("Failed to ingest {}: {e}", def.id);
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{failures} file(s) failed to ingest").into());
            }
        }
        Commands::Show { category, year } => {
            let store = open_from_env();
            let view = load_category(&store, &definition(category), year).await?;
            if view.is_empty() {
                log::warn!("{category}: no data uploaded yet");
            }
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Clear { category } => {
            let store = open_from_env();
            let deleted = store.delete_all(category).await?;
            println!("Deleted {deleted} record(s) from {category}");
        }
        Commands::Predict { years_ahead } => {
            let years_ahead = YearsAhead::new(years_ahead)?;
            let store = open_from_env();
            let client = PredictionClient::from_env();
            if !client.health().await {
                return Err(format!(
                    "Forecasting service at {} is unavailable",
                    client.base_url()
                )
                .into());
            }
            let dashboard = prediction_dashboard(&store, &client, years_ahead).await?;
            for warning in &dashboard.warnings {
                log::warn!("{warning}");
            }
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Commands::Models => {
            let client = PredictionClient::from_env();
            let info = client.model_info_all().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(emigrant_stats_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}
