//! Pipeline stages.
//!
//! Each stage reads what earlier stages wrote under `data/` and replaces
//! its own outputs. Stages run serially; [`run_all`] chains them in order.

use std::collections::BTreeMap;
use std::time::Instant;

use election_atlas_analytics::change::{CHANGE_PAIRS, compute_changes};
use election_atlas_analytics::county_results::{
    dedup_keep_last, load_mit_csv, merge_later_results, rescale_scraped,
};
use election_atlas_analytics::io::{read_records, write_records};
use election_atlas_analytics::metrics::compute_metrics;
use election_atlas_analytics::population::{CENSUS_YEARS, append_missing_year, join_population};
use election_atlas_cli_utils::{IndicatifProgress, MultiProgress};
use election_atlas_geography_models::BoundaryLevel;
use election_atlas_render::boundaries::{BoundaryLayer, conus_only, fetch_boundaries};
use election_atlas_render::projection::AlbersEqualArea;
use election_atlas_render::{choropleth, scatter, shift, symbols};
use election_atlas_results_models::{
    CountyChange, CountyResult, CountyResultWithPopulation, PopulationRecord, StateResult,
};
use election_atlas_scraper::county_map::{self, MAP_YEAR};
use election_atlas_scraper::state_table;

use crate::paths;

/// Result type shared by every stage.
pub type StageResult = Result<(), Box<dyn std::error::Error>>;

/// Renderer families selectable with `render --only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderKind {
    /// County choropleths and `GeoJSON` sidecars.
    Choropleth,
    /// County winner-votes and turnout symbol maps.
    CountySymbols,
    /// State winner-votes symbol maps.
    StateSymbols,
    /// County shift arrows.
    Shift,
    /// Population scatter charts.
    Scatter,
}

/// Presidential years covered by the state results table.
#[must_use]
pub fn state_years() -> Vec<u16> {
    (1972..=2020).step_by(4).collect()
}

/// Scrapes 2024 county results for every state.
///
/// # Errors
///
/// Returns an error if any state fails to download or the output cannot be
/// written.
pub async fn fetch_county_2024(multi: &MultiProgress) -> StageResult {
    let progress = IndicatifProgress::fetch_bar(multi, "Fetching 2024 county results");
    let results = county_map::fetch_all_states(&progress).await?;
    write_records(&paths::county_results_2024(), &results)?;
    Ok(())
}

/// Processes the MIT county CSV and merges the 2024 scrape when present.
///
/// # Errors
///
/// Returns an error if the CSV cannot be read or the output cannot be
/// written.
pub fn process_counties() -> StageResult {
    let historical = load_mit_csv(&paths::mit_csv())?;

    let later_path = paths::county_results_2024();
    let results = if later_path.exists() {
        let later: Vec<CountyResult> = read_records(&later_path)?;
        merge_later_results(historical, later)
    } else {
        log::warn!(
            "{} not found, writing {} results without it",
            later_path.display(),
            MAP_YEAR
        );
        dedup_keep_last(historical)
    };

    write_records(&paths::county_results(), &results)?;
    Ok(())
}

/// Computes county change for each year pair.
///
/// # Errors
///
/// Returns an error if the processed results cannot be read or an output
/// cannot be written.
pub fn changes(pairs: &[(u16, u16)]) -> StageResult {
    let results: Vec<CountyResult> = read_records(&paths::county_results())?;

    for &(from, to) in pairs {
        let changes = compute_changes(&results, from, to);
        write_records(&paths::county_change(from, to), &changes)?;
    }
    Ok(())
}

/// Scrapes the national state table for every year since 1972.
///
/// # Errors
///
/// Returns an error if any year fails to download or parse.
pub async fn fetch_states(multi: &MultiProgress) -> StageResult {
    let progress = IndicatifProgress::fetch_bar(multi, "Fetching state results");
    let results = state_table::fetch_years(&state_years(), &progress).await?;

    write_records(&paths::states_json(), &results)?;
    state_table::write_states_csv(&paths::states_csv(), &results)?;
    log::info!("Wrote {}", paths::states_csv().display());
    Ok(())
}

/// Fetches county population for every census year.
///
/// # Errors
///
/// Returns an error if `CENSUS_API_KEY` is unset, a request fails, or an
/// output cannot be written.
pub async fn fetch_population(multi: &MultiProgress) -> StageResult {
    let api_key = election_atlas_census::api_key_from_env()?;
    let client = reqwest::Client::new();
    let endpoints = election_atlas_census::registry::all_endpoints();

    let progress = IndicatifProgress::steps_bar(multi, "Census years", endpoints.len() as u64);
    for endpoint in &endpoints {
        progress.set_message(format!("Census {}", endpoint.year));
        let records =
            election_atlas_census::fetch_population(&client, endpoint, &api_key).await?;
        write_records(&paths::census_population(endpoint.year), &records)?;
        progress.inc(1);
    }
    progress.finish(format!("Fetched {} census years", endpoints.len()));
    Ok(())
}

/// Attaches census population to the processed county results.
///
/// The 2024 scrape is appended when the processed results predate it.
/// Census years without a file on disk are skipped with a warning.
///
/// # Errors
///
/// Returns an error if an input exists but cannot be read, or the output
/// cannot be written.
pub fn apply_population() -> StageResult {
    let mut results: Vec<CountyResult> = read_records(&paths::county_results())?;

    let later_path = paths::county_results_2024();
    if later_path.exists() {
        let later: Vec<CountyResult> = read_records(&later_path)?;
        results = append_missing_year(results, rescale_scraped(later), MAP_YEAR);
    }

    let mut census: BTreeMap<u16, Vec<PopulationRecord>> = BTreeMap::new();
    for &year in CENSUS_YEARS {
        let path = paths::census_population(year);
        if path.exists() {
            census.insert(year, read_records(&path)?);
        } else {
            log::warn!("{} not found", path.display());
        }
    }

    let joined = join_population(results, &census);
    write_records(&paths::county_results_with_population(), &joined)?;
    Ok(())
}

/// Aggregates per-year metrics.
///
/// # Errors
///
/// Returns an error if the joined results cannot be read or the output
/// cannot be written.
pub fn metrics() -> StageResult {
    let rows: Vec<CountyResultWithPopulation> =
        read_records(&paths::county_results_with_population())?;
    let metrics = compute_metrics(&rows);
    write_records(&paths::metrics(), &metrics)?;
    Ok(())
}

/// Renders maps and charts. `only` limits output to one renderer family.
///
/// Boundaries are downloaded once per run.
///
/// # Errors
///
/// Returns an error if boundaries cannot be fetched, an input cannot be
/// read, or a county renderer fails.
pub async fn render(only: Option<RenderKind>) -> StageResult {
    let wants = |kind: RenderKind| only.is_none_or(|k| k == kind);
    let dirs = paths::output_dirs();
    dirs.ensure()?;

    let client = reqwest::Client::new();
    let albers = AlbersEqualArea::conus();
    let states = BoundaryLayer::new(
        BoundaryLevel::State,
        conus_only(fetch_boundaries(&client, BoundaryLevel::State).await?),
        &albers,
    );
    let needs_counties = [
        RenderKind::Choropleth,
        RenderKind::CountySymbols,
        RenderKind::Shift,
    ]
    .into_iter()
    .any(wants);
    let counties = if needs_counties {
        BoundaryLayer::new(
            BoundaryLevel::County,
            conus_only(fetch_boundaries(&client, BoundaryLevel::County).await?),
            &albers,
        )
    } else {
        BoundaryLayer::new(BoundaryLevel::County, Vec::new(), &albers)
    };

    let needs_rows = [
        RenderKind::Choropleth,
        RenderKind::CountySymbols,
        RenderKind::Scatter,
    ]
    .into_iter()
    .any(wants);
    let rows: Vec<CountyResultWithPopulation> = if needs_rows {
        read_records(&paths::county_results_with_population())?
    } else {
        Vec::new()
    };

    let mut written = Vec::new();
    if wants(RenderKind::Choropleth) {
        written.extend(choropleth::write_choropleths(&dirs, &rows, &counties, &states)?);
    }
    if wants(RenderKind::CountySymbols) {
        written.extend(symbols::write_county_symbols(&dirs, &rows, &counties, &states)?);
    }
    if wants(RenderKind::StateSymbols) {
        let state_rows: Vec<StateResult> = read_records(&paths::states_json())?;
        written.extend(symbols::write_state_symbols(&dirs, &state_rows, &states));
    }
    if wants(RenderKind::Shift) {
        for &(from, to) in CHANGE_PAIRS {
            let path = paths::county_change(from, to);
            if !path.exists() {
                log::warn!("{} not found, skipping shift map", path.display());
                continue;
            }
            let changes: Vec<CountyChange> = read_records(&path)?;
            written.push(shift::write_shift(&dirs, from, to, &changes, &counties, &states)?);
        }
    }
    if wants(RenderKind::Scatter) {
        written.extend(scatter::write_scatters(&dirs, &rows)?);
    }

    log::info!("Rendered {} files", written.len());
    Ok(())
}

/// Runs every stage in order.
///
/// # Errors
///
/// Returns the first stage error.
pub async fn run_all(multi: &MultiProgress) -> StageResult {
    let start = Instant::now();

    fetch_county_2024(multi).await?;
    process_counties()?;
    changes(CHANGE_PAIRS)?;
    fetch_states(multi).await?;
    fetch_population(multi).await?;
    apply_population()?;
    metrics()?;
    render(None).await?;

    log::info!("Pipeline complete in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
