#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line runner for the election atlas pipeline.
//!
//! Each subcommand runs one stage. With no subcommand every stage runs in
//! order. Log output goes through `indicatif-log-bridge` (via
//! [`election_atlas_cli_utils::init_logger`]) so that log lines and
//! progress bars never fight for the terminal.

mod paths;
mod pipeline;

use clap::{Parser, Subcommand};
use election_atlas_analytics::change::CHANGE_PAIRS;

use crate::pipeline::RenderKind;

#[derive(Parser)]
#[command(name = "election_atlas", about = "U.S. presidential election data pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape 2024 county results for all 50 states and DC
    #[command(name = "fetch-county-2024")]
    FetchCounty2024,
    /// Process the MIT 2000-2020 county CSV and merge the 2024 scrape
    ProcessCounties,
    /// Compute county-level change between election years
    Changes {
        /// Earlier year. Requires `--to`; without both, every default pair runs
        #[arg(long, requires = "to")]
        from: Option<u16>,
        /// Later year
        #[arg(long, requires = "from")]
        to: Option<u16>,
    },
    /// Scrape state results for every election from 1972 to 2020
    FetchStates,
    /// Fetch decennial Census county population (needs `CENSUS_API_KEY`)
    FetchPopulation,
    /// Attach census population to county results
    ApplyPopulation,
    /// Aggregate per-year county and population metrics
    Metrics,
    /// Render maps and charts
    Render {
        /// Render only one family of outputs
        #[arg(long, value_enum)]
        only: Option<RenderKind>,
    },
    /// Run every stage in order
    All,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = election_atlas_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::All) {
        Commands::FetchCounty2024 => pipeline::fetch_county_2024(&multi).await?,
        Commands::ProcessCounties => pipeline::process_counties()?,
        Commands::Changes { from, to } => match from.zip(to) {
            Some(pair) => pipeline::changes(&[pair])?,
            None => pipeline::changes(CHANGE_PAIRS)?,
        },
        Commands::FetchStates => pipeline::fetch_states(&multi).await?,
        Commands::FetchPopulation => pipeline::fetch_population(&multi).await?,
        Commands::ApplyPopulation => pipeline::apply_population()?,
        Commands::Metrics => pipeline::metrics()?,
        Commands::Render { only } => pipeline::render(only).await?,
        Commands::All => pipeline::run_all(&multi).await?,
    }

    Ok(())
}
