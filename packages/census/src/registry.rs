//! Endpoint registry. Each `.toml` file in `packages/census/endpoints/` is
//! baked into the binary with [`include_str!`].

use crate::endpoint::{CensusEndpoint, parse_endpoint_toml};

const ENDPOINT_TOMLS: &[(&str, &str)] = &[
    ("2000", include_str!("../endpoints/2000.toml")),
    ("2010", include_str!("../endpoints/2010.toml")),
    ("2020", include_str!("../endpoints/2020.toml")),
];

/// Returns every configured endpoint, oldest census first.
///
/// # Panics
///
/// Panics if an embedded TOML config is malformed.
#[must_use]
pub fn all_endpoints() -> Vec<CensusEndpoint> {
    let mut endpoints: Vec<CensusEndpoint> = ENDPOINT_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_endpoint_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect();
    endpoints.sort_by_key(|e| e.year);
    endpoints
}

/// Returns the endpoint for a census year.
#[must_use]
pub fn endpoint_for(year: u16) -> Option<CensusEndpoint> {
    all_endpoints().into_iter().find(|e| e.year == year)
}
