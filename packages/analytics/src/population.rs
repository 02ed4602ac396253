//! Attaches decennial census population to county results.

use std::collections::{BTreeMap, HashMap};

use election_atlas_results_models::{CountyResult, CountyResultWithPopulation, PopulationRecord};

use crate::county_results::dedup_keep_last;

/// Census years with population data, oldest first.
pub const CENSUS_YEARS: &[u16] = &[2000, 2010, 2020];

/// Returns the census year whose population is used for an election year.
#[must_use]
pub const fn census_year_for(election_year: u16) -> Option<u16> {
    match election_year {
        2000 | 2004 => Some(2000),
        2008 | 2012 | 2016 => Some(2010),
        2020 | 2024 => Some(2020),
        _ => None,
    }
}

/// Appends `extra` rows when `base` has no rows for their year.
///
/// Used to fold a separately scraped year into processed results that
/// predate it.
#[must_use]
pub fn append_missing_year(
    mut base: Vec<CountyResult>,
    extra: Vec<CountyResult>,
    year: u16,
) -> Vec<CountyResult> {
    if base.iter().any(|r| r.year == year) {
        log::debug!("Results already contain {year}, not appending");
    } else {
        log::info!("Appending {} rows for {year}", extra.len());
        base.extend(extra.into_iter().filter(|r| r.year == year));
    }
    base
}

/// Left-joins population onto election results by FIPS.
///
/// Election rows are first deduplicated by `(year, fips)`. Each election
/// year is joined against its census year in ascending order. Counties
/// missing from that census keep `None` population fields. Rows whose year
/// has no census mapping are dropped.
#[must_use]
pub fn join_population(
    results: Vec<CountyResult>,
    census: &BTreeMap<u16, Vec<PopulationRecord>>,
) -> Vec<CountyResultWithPopulation> {
    let mut by_year: BTreeMap<u16, Vec<CountyResult>> = BTreeMap::new();
    for row in dedup_keep_last(results) {
        by_year.entry(row.year).or_default().push(row);
    }

    let lookups: HashMap<u16, HashMap<&str, &PopulationRecord>> = census
        .iter()
        .map(|(year, records)| {
            let by_fips = records.iter().map(|r| (r.fips.as_str(), r)).collect();
            (*year, by_fips)
        })
        .collect();

    let mut joined = Vec::new();
    for (year, mut rows) in by_year {
        let Some(census_year) = census_year_for(year) else {
            log::warn!("Dropping {} rows for {year}: no census year mapped", rows.len());
            continue;
        };
        let lookup = lookups.get(&census_year);
        if lookup.is_none() {
            log::warn!("No {census_year} census loaded; {year} rows get no population");
        }

        rows.sort_by(|a, b| a.fips.cmp(&b.fips));
        let mut matched = 0usize;
        let total = rows.len();
        for result in rows {
            let record = lookup.and_then(|l| l.get(result.fips.as_str()).copied());
            if record.is_some() {
                matched += 1;
            }
            joined.push(CountyResultWithPopulation {
                population: record.map(|r| r.population),
                white_alone: record.map(|r| r.white_alone),
                white_alone_pct: record.map(|r| r.white_alone_pct),
                result,
            });
        }
        log::info!("{year}: {matched}/{total} counties matched to {census_year} census");
    }

    joined
}
