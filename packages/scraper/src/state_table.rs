//! State results from the national results table, 1972–2020.

use std::path::Path;
use std::sync::Arc;

use election_atlas_geography_models::fips::state_fips_for;
use election_atlas_results_models::{StateResult, Winner, round_to};
use scraper::Html;

use crate::html_table::{HtmlTable, nth_table};
use crate::layouts::{StateColumn, column_layout};
use crate::progress::ProgressCallback;
use crate::{REQUEST_DELAY, ScrapeError, build_client, fetch_html, parse_vote_count};

/// Presentation columns removed before the layout is applied.
const DROPPED_COLUMNS: &[&str] = &["Map", "Pie", "Margin", "%Margin"];

/// Builds the national results URL for a year.
#[must_use]
pub fn national_url(year: u16) -> String {
    format!(
        "https://uselectionatlas.org/RESULTS/data.php?year={year}&datatype=national&def=1&f=1&off=0&elect=0"
    )
}

/// Fetches and parses one year's state table.
///
/// # Errors
///
/// Returns [`ScrapeError::UnsupportedYear`] before any request is made if
/// the year has no layout, [`ScrapeError::Http`] on request failure, and
/// [`ScrapeError::LayoutMismatch`] if the table has drifted.
pub async fn fetch_year(
    client: &reqwest::Client,
    year: u16,
) -> Result<Vec<StateResult>, ScrapeError> {
    column_layout(year)?;
    let body = fetch_html(client, &national_url(year)).await?;
    parse_national_page(&body, year)
}

/// Fetches every year in `years`, serially and in the given order.
///
/// # Errors
///
/// Returns the first [`ScrapeError`] encountered.
pub async fn fetch_years(
    years: &[u16],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<StateResult>, ScrapeError> {
    let client = build_client(None)?;
    progress.set_total(years.len() as u64);

    let mut all = Vec::new();
    for (i, &year) in years.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(REQUEST_DELAY).await;
        }
        progress.set_message(format!("Fetching {year}"));
        let rows = fetch_year(&client, year).await?;
        log::info!("Fetched {year}: {} states", rows.len());
        all.extend(rows);
        progress.inc(1);
    }

    progress.finish(format!("Fetched {} state results", all.len()));
    Ok(all)
}

/// Parses the national results page for `year`.
///
/// # Errors
///
/// Returns [`ScrapeError::UnsupportedYear`] if the year has no layout,
/// [`ScrapeError::Parse`] if the page lacks a second table, and
/// [`ScrapeError::LayoutMismatch`] if the column count differs from the
/// layout.
pub fn parse_national_page(html: &str, year: u16) -> Result<Vec<StateResult>, ScrapeError> {
    let layout = column_layout(year)?;
    let document = Html::parse_document(html);
    let mut table = nth_table(&document, 1)?;

    let state_idx = table.column_index("State");
    let margin_idx = table.column_index("Margin");
    let rows = std::mem::take(&mut table.rows);
    table.rows = rows
        .into_iter()
        .filter(|row| keep_row(row, state_idx, margin_idx))
        .collect();

    table.drop_columns(DROPPED_COLUMNS);

    if table.headers.len() != layout.len() {
        return Err(ScrapeError::LayoutMismatch {
            year,
            expected: layout.len(),
            found: table.headers.len(),
            headers: table.headers,
        });
    }

    Ok(rows_to_results(&table, layout, year))
}

fn keep_row(row: &[String], state_idx: Option<usize>, margin_idx: Option<usize>) -> bool {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map_or("", |s| s.trim());

    let state = cell(state_idx);
    let margin = cell(margin_idx);
    !state.is_empty() && !margin.is_empty() && state != "Total"
}

fn rows_to_results(table: &HtmlTable, layout: &[StateColumn], year: u16) -> Vec<StateResult> {
    table
        .rows
        .iter()
        .map(|row| {
            let cell = |column: StateColumn| {
                layout
                    .iter()
                    .position(|c| *c == column)
                    .and_then(|i| row.get(i))
                    .map_or("", String::as_str)
            };
            let count = |column: StateColumn| parse_vote_count(cell(column));

            let state_name = cell(StateColumn::State).trim().to_string();
            let total_votes = count(StateColumn::TotalVote);
            let r_votes = count(StateColumn::RepVotes);
            let d_votes = count(StateColumn::DemVotes);
            let other_votes = count(StateColumn::OtherVotes) + count(StateColumn::Other2Votes);
            let r_ev = u32::try_from(count(StateColumn::RepEv)).unwrap_or(0);
            let d_ev = u32::try_from(count(StateColumn::DemEv)).unwrap_or(0);

            StateResult {
                state_fips: state_fips_for(&state_name).map(str::to_string),
                state_name,
                year,
                r_ev,
                d_ev,
                total_votes,
                r_votes,
                d_votes,
                other_votes,
                r_pct: percent_of(r_votes, total_votes),
                d_pct: percent_of(d_votes, total_votes),
                o_pct: percent_of(other_votes, total_votes),
                winner: electoral_winner(r_ev, d_ev),
            }
        })
        .collect()
}

/// Electoral-vote winner. A tie goes to the Republican column, which comes
/// first.
#[must_use]
pub const fn electoral_winner(r_ev: u32, d_ev: u32) -> Winner {
    if d_ev > r_ev { Winner::Dem } else { Winner::Rep }
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(votes as f64 / total as f64 * 100.0, 2)
}

/// Writes state results as CSV with a header row.
///
/// # Errors
///
/// Returns [`ScrapeError::Csv`] or [`ScrapeError::Io`] if the file cannot be
/// written.
pub fn write_states_csv(path: &Path, results: &[StateResult]) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
