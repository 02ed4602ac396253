#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County population from the decennial Census API.
//!
//! Each census year is described by an embedded [`endpoint::CensusEndpoint`]
//! naming the dataset and the two variables read from it: total population
//! and white alone, not Hispanic or Latino.

pub mod endpoint;
pub mod registry;

use election_atlas_geography_models::fips::pad_county_fips;
use election_atlas_results_models::{PopulationRecord, round_to};

use crate::endpoint::CensusEndpoint;

/// Environment variable holding the Census API key.
pub const API_KEY_VAR: &str = "CENSUS_API_KEY";

/// Errors that can occur while fetching census data.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// `CENSUS_API_KEY` is not set.
    #[error("Missing Census API key: set CENSUS_API_KEY")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response was not a JSON array of string arrays.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An embedded endpoint config is malformed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The response had an unexpected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Reads the API key from the environment.
///
/// # Errors
///
/// Returns [`CensusError::MissingApiKey`] if the variable is unset or empty.
pub fn api_key_from_env() -> Result<String, CensusError> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(CensusError::MissingApiKey)
}

/// Fetches county population for one endpoint.
///
/// # Errors
///
/// Returns [`CensusError::Http`] if the request fails, [`CensusError::Json`]
/// if the body is not an array of string arrays, and [`CensusError::Parse`]
/// if required columns are missing.
pub async fn fetch_population(
    client: &reqwest::Client,
    endpoint: &CensusEndpoint,
    api_key: &str,
) -> Result<Vec<PopulationRecord>, CensusError> {
    log::info!("Fetching {} census population...", endpoint.year);

    let resp = client
        .get(endpoint.request_url(api_key))
        .send()
        .await?
        .error_for_status()?;
    let body = resp.text().await?;

    // [["P1_001N","P2_005N","NAME","state","county"],
    //  ["58805","34012","Autauga County, Alabama","01","001"], ...]
    let rows: Vec<Vec<String>> = serde_json::from_str(&body)?;
    let records = parse_census_rows(&rows, endpoint)?;

    log::info!("{} census: {} counties", endpoint.year, records.len());
    Ok(records)
}

/// Converts a Census API response into population records.
///
/// Columns are located by name in the header row (case-insensitive). Rows
/// with a non-numeric count or a malformed FIPS are skipped.
///
/// # Errors
///
/// Returns [`CensusError::Parse`] if the response is empty or a required
/// column is missing from the header.
pub fn parse_census_rows(
    rows: &[Vec<String>],
    endpoint: &CensusEndpoint,
) -> Result<Vec<PopulationRecord>, CensusError> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| CensusError::Parse("empty census response".to_string()))?;

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| CensusError::Parse(format!("census response has no '{name}' column")))
    };
    let pop_idx = column(&endpoint.population)?;
    let white_idx = column(&endpoint.white_alone)?;
    let name_idx = column("NAME")?;
    let state_idx = column("state")?;
    let county_idx = column("county")?;

    let mut records = Vec::with_capacity(body.len());
    for row in body {
        let get = |i: usize| row.get(i).map_or("", |s| s.trim());

        let (Ok(population), Ok(white_alone)) =
            (get(pop_idx).parse::<u64>(), get(white_idx).parse::<u64>())
        else {
            log::debug!("Skipping census row with non-numeric counts: {row:?}");
            continue;
        };

        let Some(fips) = pad_county_fips(&format!("{}{}", get(state_idx), get(county_idx))) else {
            log::debug!("Skipping census row with malformed FIPS: {row:?}");
            continue;
        };

        let (place, state_name) = get(name_idx)
            .split_once(", ")
            .unwrap_or((get(name_idx), ""));

        records.push(PopulationRecord {
            fips,
            place: place.to_string(),
            state_name: state_name.to_string(),
            population,
            white_alone,
            white_alone_pct: white_alone_pct(white_alone, population),
            year: endpoint.year,
        });
    }

    Ok(records)
}

/// `white / population × 100`, two decimals. Zero population gives zero.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn white_alone_pct(white_alone: u64, population: u64) -> f64 {
    if population == 0 {
        return 0.0;
    }
    round_to(white_alone as f64 / population as f64 * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::endpoint_for;

    fn rows(json: &serde_json::Value) -> Vec<Vec<String>> {
        serde_json::from_value(json.clone()).unwrap()
    }

    #[test]
    fn parses_2020_response() {
        let endpoint = endpoint_for(2020).unwrap();
        let data = rows(&serde_json::json!([
            ["P1_001N", "P2_005N", "NAME", "state", "county"],
            ["58805", "42160", "Autauga County, Alabama", "01", "001"],
            ["1000", "250", "Kalawao County, Hawaii", "15", "005"],
        ]));

        let records = parse_census_rows(&data, &endpoint).unwrap();
        assert_eq!(records.len(), 2);

        let autauga = &records[0];
        assert_eq!(autauga.fips, "01001");
        assert_eq!(autauga.place, "Autauga County");
        assert_eq!(autauga.state_name, "Alabama");
        assert_eq!(autauga.population, 58_805);
        assert_eq!(autauga.white_alone, 42_160);
        assert!((autauga.white_alone_pct - 71.69).abs() < 1e-9);
        assert_eq!(autauga.year, 2020);

        assert!((records[1].white_alone_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn header_match_is_case_insensitive() {
        let endpoint = endpoint_for(2000).unwrap();
        let data = rows(&serde_json::json!([
            ["p001001", "p004003", "name", "STATE", "COUNTY"],
            ["200", "100", "Adams County, Colorado", "08", "001"],
        ]));
        let records = parse_census_rows(&data, &endpoint).unwrap();
        assert_eq!(records[0].fips, "08001");
        assert_eq!(records[0].year, 2000);
    }

    #[test]
    fn skips_rows_with_bad_counts() {
        let endpoint = endpoint_for(2010).unwrap();
        let data = rows(&serde_json::json!([
            ["P001001", "P005003", "NAME", "state", "county"],
            ["n/a", "1", "X County, Texas", "48", "001"],
            ["10", "5", "Y County, Texas", "48", "003"],
        ]));
        let records = parse_census_rows(&data, &endpoint).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fips, "48003");
    }

    #[test]
    fn missing_column_is_an_error() {
        let endpoint = endpoint_for(2020).unwrap();
        let data = rows(&serde_json::json!([["P1_001N", "NAME", "state", "county"]]));
        assert!(matches!(
            parse_census_rows(&data, &endpoint),
            Err(CensusError::Parse(_))
        ));
        assert!(matches!(
            parse_census_rows(&[], &endpoint),
            Err(CensusError::Parse(_))
        ));
    }

    #[test]
    fn zero_population_has_zero_share() {
        assert!(white_alone_pct(0, 0).abs() < f64::EPSILON);
    }
}
