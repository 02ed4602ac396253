//! County results from a state's image-map results page.
//!
//! The 2024 state pages render a clickable county map. Each `<area>`
//! carries the county FIPS in its link, the county name in `alt`, and an
//! HTML-escaped popup table inside `onmouseover="showAltMsg('...')"`:
//!
//! ```text
//! <td>Total Vote:</td><td>12,345</td>
//! <td>Harris</td><td>(D)</td><td>41.2%</td>
//! <td>Trump</td><td>(R)</td><td>57.4%</td>
//! ```

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use election_atlas_geography_models::fips::{STATES, pad_county_fips, pad_state_fips, state_abbr};
use election_atlas_results_models::{CountyResult, Winner, round_to};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::html_table::{element_text, parse_selector};
use crate::progress::ProgressCallback;
use crate::{REQUEST_DELAY, ScrapeError, build_client, fetch_html, parse_percent};

/// Election year published on the image-map pages.
pub const MAP_YEAR: u16 = 2024;

/// Per-request timeout for state pages.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static FIPS_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fips=([0-9]+)").expect("valid FIPS regex"));

static ALT_MSG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)showAltMsg\('(.*)'\)").expect("valid showAltMsg regex"));

/// Builds the results URL for a state.
#[must_use]
pub fn state_url(state_fips: &str) -> String {
    let numeric = state_fips.trim().parse::<u32>().unwrap_or_default();
    format!(
        "https://uselectionatlas.org/RESULTS/state.php?year={MAP_YEAR}&fips={numeric}&f=1&off=0&elect=0"
    )
}

/// Fetches and parses every county on one state's page.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the request fails or the server
/// responds with an error status, and [`ScrapeError::Parse`] for a state
/// code that is not in the state table.
pub async fn fetch_state_counties(
    client: &reqwest::Client,
    state_fips: &str,
) -> Result<Vec<CountyResult>, ScrapeError> {
    let padded = pad_state_fips(state_fips)
        .ok_or_else(|| ScrapeError::Parse(format!("invalid state FIPS '{state_fips}'")))?;
    let abbr = state_abbr(&padded);
    if abbr == "??" {
        return Err(ScrapeError::Parse(format!("unknown state FIPS '{padded}'")));
    }

    let body = fetch_html(client, &state_url(&padded)).await?;
    parse_state_page(&body, abbr)
}

/// Fetches all 50 states plus DC, one request at a time.
///
/// # Errors
///
/// Returns the first [`ScrapeError`] encountered. Counties already fetched
/// for earlier states are discarded.
pub async fn fetch_all_states(
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<CountyResult>, ScrapeError> {
    let client = build_client(Some(REQUEST_TIMEOUT))?;
    progress.set_total(STATES.len() as u64);

    let mut all = Vec::new();
    for (i, state) in STATES.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(REQUEST_DELAY).await;
        }
        progress.set_message(format!("Fetching {}", state.abbr));
        let counties = fetch_state_counties(&client, state.fips).await?;
        log::info!("Fetched {}: {} counties", state.abbr, counties.len());
        all.extend(counties);
        progress.inc(1);
    }

    progress.finish(format!("Fetched {} county results", all.len()));
    Ok(all)
}

/// Parses a state results page.
///
/// A page without a `<map>` element yields no records.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] only if an internal selector is invalid.
pub fn parse_state_page(html: &str, state_po: &str) -> Result<Vec<CountyResult>, ScrapeError> {
    let document = Html::parse_document(html);
    let map_sel = parse_selector("map")?;
    let area_sel = parse_selector("area")?;

    let Some(map) = document.select(&map_sel).next() else {
        log::warn!("{state_po}: no image map on page");
        return Ok(Vec::new());
    };

    let mut results = Vec::new();
    let mut skipped = 0usize;
    for area in map.select(&area_sel) {
        match parse_area(area, state_po)? {
            Some(result) => results.push(result),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("{state_po}: skipped {skipped} map regions without usable results");
    }
    Ok(results)
}

/// Parses one `<area>` region. `Ok(None)` means the region is skipped.
fn parse_area(area: ElementRef<'_>, state_po: &str) -> Result<Option<CountyResult>, ScrapeError> {
    let attrs = area.value();

    let href = attrs.attr("href").unwrap_or_default();
    let Some(fips) = FIPS_PARAM
        .captures(href)
        .and_then(|c| pad_county_fips(&c[1]))
    else {
        return Ok(None);
    };

    let county_name = attrs
        .attr("alt")
        .unwrap_or_default()
        .trim()
        .replace(" County", "")
        .to_uppercase();

    let over = attrs.attr("onmouseover").unwrap_or_default();
    let Some(fragment) = ALT_MSG.captures(over).map(|c| c[1].to_string()) else {
        return Ok(None);
    };

    let cells = popup_cells(&fragment)?;
    let Some(shares) = PopupShares::from_cells(&cells) else {
        return Ok(None);
    };

    Ok(Some(shares.into_result(fips, county_name, state_po)))
}

/// Returns the trimmed `<td>` texts of a popup fragment.
///
/// The fragment is usually still entity-escaped after attribute decoding
/// (`&lt;td&gt;...`). If parsing it directly yields no cells, its decoded
/// text is parsed a second time.
fn popup_cells(fragment: &str) -> Result<Vec<String>, ScrapeError> {
    let td_sel = parse_selector("td")?;

    let parsed = Html::parse_fragment(fragment);
    let cells: Vec<String> = parsed.select(&td_sel).map(element_text).collect();
    if !cells.is_empty() {
        return Ok(cells);
    }

    let unescaped: String = parsed.root_element().text().collect();
    let reparsed = Html::parse_fragment(&unescaped);
    Ok(reparsed.select(&td_sel).map(element_text).collect())
}

/// Figures read from one popup table.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PopupShares {
    total: u64,
    dem: f64,
    rep: f64,
}

impl PopupShares {
    /// Reads the total and party shares. `None` without a total.
    fn from_cells(cells: &[String]) -> Option<Self> {
        let total_idx = cells.iter().position(|c| c == "Total Vote:")?;
        let total_text = cells.get(total_idx + 1)?;
        let digits: String = total_text.chars().filter(|c| *c != ',').collect();
        let total = digits.trim().parse::<u64>().ok()?;

        // Candidate rows are [name][(party)][percent]; the last match wins.
        let mut dem = None;
        let mut rep = None;
        for pair in cells.windows(2) {
            match pair[0].as_str() {
                "(D)" => dem = parse_percent(&pair[1]),
                "(R)" => rep = parse_percent(&pair[1]),
                _ => {}
            }
        }

        Some(Self {
            total,
            dem: dem.unwrap_or(0.0),
            rep: rep.unwrap_or(0.0),
        })
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn into_result(self, fips: String, county_name: String, state_po: &str) -> CountyResult {
        let votes = |share: f64| (self.total as f64 * share).round_ties_even().max(0.0) as u64;

        CountyResult {
            fips,
            county_name,
            state_po: state_po.to_string(),
            year: MAP_YEAR,
            votes_dem: votes(self.dem),
            votes_rep: votes(self.rep),
            votes_all: self.total,
            dem_pct: round_to(self.dem, 4),
            rep_pct: round_to(self.rep, 4),
            margin: None,
            winner: Winner::from_shares_dem_on_tie(self.dem, self.rep),
        }
    }
}
