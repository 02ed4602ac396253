//! Decennial Census API endpoint definition.

use serde::Deserialize;

use crate::CensusError;

/// One decennial table queried for county population.
///
/// Loaded from TOML files embedded at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CensusEndpoint {
    /// Census year (2000, 2010, or 2020).
    pub year: u16,
    /// Dataset base URL, without a query string.
    pub url: String,
    /// Value of the `for=` geography predicate.
    pub geography: String,
    /// Variable holding the total population.
    pub population: String,
    /// Variable holding the white alone, not Hispanic or Latino count.
    pub white_alone: String,
}

impl CensusEndpoint {
    /// Builds the request URL for this endpoint.
    #[must_use]
    pub fn request_url(&self, api_key: &str) -> String {
        format!(
            "{}?get={},{},NAME&for={}&key={api_key}",
            self.url, self.population, self.white_alone, self.geography
        )
    }
}

/// Parses a TOML string into a [`CensusEndpoint`].
///
/// # Errors
///
/// Returns [`CensusError::Toml`] if the TOML is malformed or missing
/// required fields.
pub fn parse_endpoint_toml(toml_str: &str) -> Result<CensusEndpoint, CensusError> {
    Ok(toml::de::from_str(toml_str)?)
}
