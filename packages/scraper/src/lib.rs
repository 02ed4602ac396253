#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scrapers for presidential results published on uselectionatlas.org.
//!
//! Two page shapes are supported:
//!
//! - [`county_map`]: a state's 2024 results page, whose county figures
//!   live in the mouse-over popups of an HTML image map.
//! - [`state_table`]: the national results page for a year, whose second
//!   table lists every state. Column order varies by decade and is pinned
//!   by the per-year [`layouts`].
//!
//! Requests are issued one at a time, [`REQUEST_DELAY`] apart, with no
//! retries. An HTTP failure
//! aborts the stage; a row that cannot be parsed is skipped.

pub mod county_map;
pub mod html_table;
pub mod layouts;
pub mod progress;
pub mod state_table;

use std::time::Duration;

/// Browser-like User-Agent. The site rejects obvious bot agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Pause between consecutive page requests.
pub const REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No column layout is defined for the requested election year.
    #[error("Unsupported election year: {0}")]
    UnsupportedYear(u16),

    /// The results table has a different number of columns than the
    /// year's layout expects.
    #[error("Layout mismatch for {year}: expected {expected} columns, found {found} ({headers:?})")]
    LayoutMismatch {
        /// Election year being parsed.
        year: u16,
        /// Column count from the layout table.
        expected: usize,
        /// Column count found in the page header.
        found: usize,
        /// The page's header labels, for diagnosing the drift.
        headers: Vec<String>,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Builds the HTTP client shared by both scrapers.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be built.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, ScrapeError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(ACCEPT),
    );

    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(ScrapeError::Http)
}

/// Fetches a page body, treating non-2xx responses as errors.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] on transport failure or error status.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, ScrapeError> {
    log::debug!("GET {url}");
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Parses a vote count such as `"1,234,567"`.
///
/// Anything that is not a plain digit string after removing commas and
/// whitespace counts as zero.
#[must_use]
pub fn parse_vote_count(raw: &str) -> u64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    cleaned.parse().unwrap_or(0)
}

/// Parses a percentage cell such as `"48.3%"` into a fraction (`0.483`).
///
/// An empty cell is `Some(0.0)`; text that is not a number is `None`.
#[must_use]
pub fn parse_percent(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('%', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().map(|v| v / 100.0)
}
