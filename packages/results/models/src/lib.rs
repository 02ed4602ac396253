#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for presidential election results.
//!
//! Every stage of the pipeline reads and writes these types as
//! records-oriented JSON. They are plain data: all derivation logic lives
//! in the scraper and analytics crates.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The party that carried a county or state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Winner {
    /// Democratic candidate had the larger share.
    Dem,
    /// Republican candidate had the larger share.
    Rep,
    /// Exactly equal shares.
    Tie,
}

impl Winner {
    /// Picks the winner from two shares, reporting [`Winner::Dem`] on an
    /// exact tie. Used for scraped results, which never report a tie.
    #[must_use]
    pub fn from_shares_dem_on_tie(dem: f64, rep: f64) -> Self {
        if dem >= rep { Self::Dem } else { Self::Rep }
    }

    /// Picks the winner from two shares, reporting [`Winner::Tie`] when
    /// they are exactly equal.
    #[must_use]
    pub fn from_shares(dem: f64, rep: f64) -> Self {
        if dem > rep {
            Self::Dem
        } else if dem < rep {
            Self::Rep
        } else {
            Self::Tie
        }
    }
}

/// County-level presidential result for one election year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyResult {
    /// Five-digit county FIPS code.
    pub fips: String,
    /// Upper-cased county name without the "County" suffix.
    pub county_name: String,
    /// Two-letter state postal abbreviation.
    pub state_po: String,
    /// Election year.
    pub year: u16,
    /// Democratic votes.
    pub votes_dem: u64,
    /// Republican votes.
    pub votes_rep: u64,
    /// All votes cast, including third parties.
    pub votes_all: u64,
    /// Democratic share. 0–1 in raw scrapes, 0–100 once processed.
    pub dem_pct: f64,
    /// Republican share, same scale as `dem_pct`.
    pub rep_pct: f64,
    /// `rep_pct - dem_pct`, present on processed rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    /// Party with the larger share.
    pub winner: Winner,
}

impl CountyResult {
    /// Votes received by the winning party; zero on a tie.
    #[must_use]
    pub const fn winner_votes(&self) -> u64 {
        match self.winner {
            Winner::Dem => self.votes_dem,
            Winner::Rep => self.votes_rep,
            Winner::Tie => 0,
        }
    }

    /// Share held by the winning party; `None` on a tie.
    #[must_use]
    pub const fn winner_pct(&self) -> Option<f64> {
        match self.winner {
            Winner::Dem => Some(self.dem_pct),
            Winner::Rep => Some(self.rep_pct),
            Winner::Tie => None,
        }
    }
}

/// A county's results in two years, joined on FIPS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyChange {
    /// Five-digit county FIPS code.
    pub fips: String,
    /// County name as reported in the later year.
    pub county_name: String,
    /// State postal abbreviation.
    pub state_po: String,
    /// Snapshot from the earlier year.
    pub before: CountyResult,
    /// Snapshot from the later year.
    pub after: CountyResult,
    /// Change in Democratic share, in percentage points.
    pub dem_pct_diff: f64,
    /// Change in Republican share, in percentage points.
    pub rep_pct_diff: f64,
    /// Change in `rep_pct - dem_pct`. Negative values moved toward the
    /// Democrats.
    pub margin_diff: f64,
    /// Whether the winning party differs between the two years.
    pub flipped: bool,
}

/// State-level presidential result scraped from the national table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResult {
    /// Two-digit state FIPS, when the row label resolves to a state.
    pub state_fips: Option<String>,
    /// State label as printed in the source table.
    pub state_name: String,
    /// Election year.
    pub year: u16,
    /// Republican electoral votes.
    pub r_ev: u32,
    /// Democratic electoral votes.
    pub d_ev: u32,
    /// Total popular vote.
    pub total_votes: u64,
    /// Republican popular vote.
    pub r_votes: u64,
    /// Democratic popular vote.
    pub d_votes: u64,
    /// Combined popular vote of all other candidates.
    pub other_votes: u64,
    /// Republican share of the total, 0–100.
    pub r_pct: f64,
    /// Democratic share of the total, 0–100.
    pub d_pct: f64,
    /// Other-candidate share of the total, 0–100.
    pub o_pct: f64,
    /// Electoral-vote winner.
    pub winner: Winner,
}

/// Decennial Census population for one county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Five-digit county FIPS code.
    pub fips: String,
    /// County name, e.g. "Autauga County".
    pub place: String,
    /// State name.
    pub state_name: String,
    /// Total population.
    pub population: u64,
    /// White alone, not Hispanic or Latino.
    pub white_alone: u64,
    /// `white_alone / population * 100`, two decimals.
    pub white_alone_pct: f64,
    /// Census year (2000, 2010, or 2020).
    pub year: u16,
}

/// A county result with the nearest census year's population attached.
///
/// Population fields are `None` when the county has no match in that
/// census.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyResultWithPopulation {
    /// The election result.
    #[serde(flatten)]
    pub result: CountyResult,
    /// Total population.
    pub population: Option<u64>,
    /// White alone, not Hispanic or Latino.
    pub white_alone: Option<u64>,
    /// White alone share of the population, 0–100.
    pub white_alone_pct: Option<f64>,
}

/// Per-year aggregate of counties won by each party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionMetrics {
    /// Election year.
    pub year: u16,
    /// Counties where Republicans received strictly more votes.
    pub num_r_counties: u64,
    /// All remaining counties.
    pub num_d_counties: u64,
    /// `num_r_counties / total`.
    pub share_r_counties: Option<f64>,
    /// `num_d_counties / total`.
    pub share_d_counties: Option<f64>,
    /// Population living in Republican-won counties.
    pub pop_r_counties: u64,
    /// Population living in Democratic-won counties.
    pub pop_d_counties: u64,
    /// `pop_r_counties / total population`.
    pub share_r_population: Option<f64>,
    /// `pop_d_counties / total population`.
    pub share_d_population: Option<f64>,
    /// Population-weighted white alone percentage in Republican counties.
    pub pct_white_r_counties: Option<f64>,
    /// Population-weighted white alone percentage in Democratic counties.
    pub pct_white_d_counties: Option<f64>,
}

/// Rounds to `decimals` places, resolving exact halves to even.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
