//! County-level change between two election years.

use std::collections::HashMap;

use election_atlas_results_models::{CountyChange, CountyResult, round_to};

/// Year pairs written by the pipeline, earlier year first.
pub const CHANGE_PAIRS: &[(u16, u16)] = &[(2000, 2020), (2016, 2020), (2020, 2024)];

/// Joins the `from` and `to` rows on FIPS and computes percentage-point
/// changes.
///
/// Counties present in only one of the two years are dropped. Output is
/// ordered by FIPS.
#[must_use]
pub fn compute_changes(results: &[CountyResult], from: u16, to: u16) -> Vec<CountyChange> {
    let before: HashMap<&str, &CountyResult> = results
        .iter()
        .filter(|r| r.year == from)
        .map(|r| (r.fips.as_str(), r))
        .collect();

    let mut changes: Vec<CountyChange> = results
        .iter()
        .filter(|r| r.year == to)
        .filter_map(|after| {
            let before = before.get(after.fips.as_str())?;
            Some(county_change(before, after))
        })
        .collect();

    changes.sort_by(|a, b| a.fips.cmp(&b.fips));
    changes.dedup_by(|a, b| a.fips == b.fips);

    let dropped = results
        .iter()
        .filter(|r| r.year == to)
        .count()
        .saturating_sub(changes.len());
    log::info!(
        "{from}->{to}: {} counties joined, {dropped} without a {from} match",
        changes.len()
    );
    changes
}

fn county_change(before: &CountyResult, after: &CountyResult) -> CountyChange {
    CountyChange {
        fips: after.fips.clone(),
        county_name: after.county_name.clone(),
        state_po: after.state_po.clone(),
        dem_pct_diff: round_to(after.dem_pct - before.dem_pct, 2),
        rep_pct_diff: round_to(after.rep_pct - before.rep_pct, 2),
        margin_diff: round_to(margin_of(after) - margin_of(before), 2),
        flipped: before.winner != after.winner,
        before: before.clone(),
        after: after.clone(),
    }
}

fn margin_of(result: &CountyResult) -> f64 {
    result
        .margin
        .unwrap_or_else(|| result.rep_pct - result.dem_pct)
}
