#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic identifiers shared across the election pipeline.
//!
//! State and county FIPS codes are the join keys between election results,
//! Census population tables, and boundary geometries. Everything in this
//! crate is a pure lookup or string normalization.

pub mod fips;

use serde::{Deserialize, Serialize};

/// Which of the two boundary layers a geometry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryLevel {
    /// State outlines, keyed by two-digit FIPS.
    State,
    /// County polygons, keyed by five-digit FIPS.
    County,
}

/// State postal abbreviations excluded from contiguous-U.S. maps.
pub const NON_CONUS_STATES: &[&str] = &["AK", "HI"];

/// Returns `true` if the postal abbreviation belongs to the contiguous U.S.
#[must_use]
pub fn is_conus(state_po: &str) -> bool {
    !NON_CONUS_STATES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(state_po.trim()))
}
