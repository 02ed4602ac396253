//! Historical county results from the MIT Election Lab CSV.
//!
//! The CSV has one row per county, candidate, and vote mode (election day,
//! early, provisional, ...). Some states also publish a `TOTAL` mode, others
//! do not, so rows are summed per candidate before pivoting to one record
//! per county and year.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use election_atlas_geography_models::fips::pad_county_fips;
use election_atlas_results_models::{CountyResult, Winner, round_to};
use serde::Deserialize;

use crate::AnalyticsError;

/// Candidate spellings unified before aggregation.
const CANDIDATE_RENAMES: &[(&str, &str)] =
    &[("JOSEPH R BIDEN JR", "JOE BIDEN"), ("J TRUMP", "TRUMP")];

/// One row of `countypres_2000-2020.csv`. Unused columns are ignored.
#[derive(Debug, Deserialize)]
struct MitRow {
    year: String,
    state: String,
    state_po: String,
    county_name: String,
    county_fips: Option<String>,
    candidate: String,
    party: String,
    candidatevotes: String,
    totalvotes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Party {
    Dem,
    Rep,
}

impl Party {
    fn from_label(label: &str) -> Option<Self> {
        if label.contains("DEMOCRAT") {
            Some(Self::Dem)
        } else if label.contains("REPUBLICAN") {
            Some(Self::Rep)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CandidateKey {
    year: u16,
    state: String,
    state_po: String,
    county_name: String,
    fips: String,
    candidate: String,
    party: String,
}

/// Summed candidate votes and the mean of the reported county totals.
#[derive(Debug, Default)]
struct CandidateTally {
    votes: u64,
    total_sum: f64,
    rows: u32,
}

impl CandidateTally {
    fn mean_total(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.total_sum / f64::from(self.rows)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CountyKey {
    fips: String,
    county_name: String,
    state_po: String,
    year: u16,
}

#[derive(Debug, Default)]
struct PartyColumns {
    votes_dem: u64,
    votes_rep: u64,
    total_dem: Option<f64>,
    total_rep: Option<f64>,
}

/// Reads and processes the MIT county CSV at `path`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Io`] if the file cannot be opened and
/// [`AnalyticsError::Csv`] if its header is unreadable.
pub fn load_mit_csv(path: &Path) -> Result<Vec<CountyResult>, AnalyticsError> {
    let reader = std::fs::File::open(path)?;
    let results = process_mit_csv(reader)?;
    log::info!(
        "Processed {} county results from {}",
        results.len(),
        path.display()
    );
    Ok(results)
}

/// Processes MIT county CSV rows into one [`CountyResult`] per county and
/// year.
///
/// Only Democratic and Republican rows with a positive county total and a
/// numeric FIPS are kept. Shares are on the 0–100 scale.
///
/// # Errors
///
/// Returns [`AnalyticsError::Csv`] if the header cannot be read.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn process_mit_csv(reader: impl Read) -> Result<Vec<CountyResult>, AnalyticsError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    csv_reader.headers()?;

    let mut tallies: BTreeMap<CandidateKey, CandidateTally> = BTreeMap::new();
    let mut skipped = 0u64;

    for result in csv_reader.deserialize::<MitRow>() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("skipping malformed row: {e}");
                skipped += 1;
                continue;
            }
        };

        let Some(key) = candidate_key(&row) else {
            skipped += 1;
            continue;
        };

        let tally = tallies.entry(key).or_default();
        tally.votes += parse_count(&row.candidatevotes).max(0.0).round_ties_even() as u64;
        tally.total_sum += parse_count(&row.totalvotes);
        tally.rows += 1;
    }

    if skipped > 0 {
        log::debug!("Filtered {skipped} rows (minor party, zero total, or no FIPS)");
    }

    Ok(pivot(&tallies))
}

/// Builds the aggregation key for a row, or `None` if it is filtered out.
fn candidate_key(row: &MitRow) -> Option<CandidateKey> {
    Party::from_label(&row.party)?;
    if parse_count(&row.totalvotes) <= 0.0 {
        return None;
    }
    let fips = pad_county_fips(row.county_fips.as_deref()?)?;
    let year = row.year.trim().parse::<u16>().ok()?;

    Some(CandidateKey {
        year,
        state: row.state.clone(),
        state_po: row.state_po.clone(),
        county_name: row.county_name.clone(),
        fips,
        candidate: normalize_candidate(&row.candidate),
        party: row.party.clone(),
    })
}

/// Applies the candidate spelling fixes.
#[must_use]
pub fn normalize_candidate(name: &str) -> String {
    CANDIDATE_RENAMES
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Parses a vote count. Non-numeric text counts as zero.
fn parse_count(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pivot(tallies: &BTreeMap<CandidateKey, CandidateTally>) -> Vec<CountyResult> {
    let mut counties: BTreeMap<CountyKey, PartyColumns> = BTreeMap::new();

    for (key, tally) in tallies {
        let Some(party) = Party::from_label(&key.party) else {
            continue;
        };
        let columns = counties
            .entry(CountyKey {
                fips: key.fips.clone(),
                county_name: key.county_name.clone(),
                state_po: key.state_po.clone(),
                year: key.year,
            })
            .or_default();

        match party {
            Party::Dem => {
                columns.votes_dem += tally.votes;
                columns.total_dem.get_or_insert(tally.mean_total());
            }
            Party::Rep => {
                columns.votes_rep += tally.votes;
                columns.total_rep.get_or_insert(tally.mean_total());
            }
        }
    }

    counties
        .into_iter()
        .filter_map(|(key, columns)| {
            let total = columns.total_dem.or(columns.total_rep)?;
            let votes_all = total.max(0.0).round_ties_even() as u64;
            if votes_all == 0 {
                return None;
            }
            Some(county_result(key, &columns, votes_all))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn county_result(key: CountyKey, columns: &PartyColumns, votes_all: u64) -> CountyResult {
    let share = |votes: u64| votes as f64 / votes_all as f64 * 100.0;
    let dem_raw = share(columns.votes_dem);
    let rep_raw = share(columns.votes_rep);

    let dem_pct = round_to(dem_raw, 2);
    let rep_pct = round_to(rep_raw, 2);

    CountyResult {
        fips: key.fips,
        county_name: key.county_name,
        state_po: key.state_po,
        year: key.year,
        votes_dem: columns.votes_dem,
        votes_rep: columns.votes_rep,
        votes_all,
        dem_pct,
        rep_pct,
        margin: Some(round_to(rep_pct - dem_pct, 2)),
        winner: Winner::from_shares(dem_raw, rep_raw),
    }
}

/// Appends a later scrape (0–1 shares, no margin) to processed results.
///
/// The scraped shares are rescaled to 0–100 and given a margin. Rows are
/// then deduplicated by `(year, fips)`, keeping the one loaded last.
#[must_use]
pub fn merge_later_results(
    historical: Vec<CountyResult>,
    later: Vec<CountyResult>,
) -> Vec<CountyResult> {
    let combined: Vec<CountyResult> = historical
        .into_iter()
        .chain(rescale_scraped(later))
        .collect();
    dedup_keep_last(combined)
}

/// Rescales scraped 0–1 shares to 0–100 and fills in the margin.
#[must_use]
pub fn rescale_scraped(rows: Vec<CountyResult>) -> Vec<CountyResult> {
    rows.into_iter()
        .map(|mut row| {
            row.dem_pct = round_to(row.dem_pct * 100.0, 2);
            row.rep_pct = round_to(row.rep_pct * 100.0, 2);
            row.margin = Some(round_to(row.rep_pct - row.dem_pct, 2));
            row
        })
        .collect()
}

/// Drops earlier rows that share a `(year, fips)` with a later row.
///
/// Surviving rows keep the position of their last occurrence.
#[must_use]
pub fn dedup_keep_last(rows: Vec<CountyResult>) -> Vec<CountyResult> {
    let mut last_index: HashMap<(u16, String), usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        last_index.insert((row.year, row.fips.clone()), i);
    }

    let before = rows.len();
    let kept: Vec<CountyResult> = rows
        .into_iter()
        .enumerate()
        .filter(|(i, row)| last_index.get(&(row.year, row.fips.clone())) == Some(i))
        .map(|(_, row)| row)
        .collect();

    if kept.len() != before {
        log::info!(
            "Dropped {} duplicate rows by (year, fips)",
            before - kept.len()
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "year,state,state_po,county_name,county_fips,office,candidate,party,candidatevotes,totalvotes,version,mode";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn processes_two_state_fixture() {
        let data = csv(&[
            // Alabama: vote modes are split and must be summed.
            "2020,ALABAMA,AL,AUTAUGA,1001,US PRESIDENT,JOSEPH R BIDEN JR,DEMOCRAT,7000,27770,20220315,ELECTION DAY",
            "2020,ALABAMA,AL,AUTAUGA,1001,US PRESIDENT,JOSEPH R BIDEN JR,DEMOCRAT,2000,27770,20220315,ABSENTEE",
            "2020,ALABAMA,AL,AUTAUGA,1001,US PRESIDENT,DONALD J TRUMP,REPUBLICAN,14000,27770,20220315,ELECTION DAY",
            "2020,ALABAMA,AL,AUTAUGA,1001,US PRESIDENT,DONALD J TRUMP,REPUBLICAN,1770,27770,20220315,ABSENTEE",
            "2020,ALABAMA,AL,AUTAUGA,1001,US PRESIDENT,JO JORGENSEN,LIBERTARIAN,500,27770,20220315,TOTAL",
            // Delaware: single total mode.
            "2020,DELAWARE,DE,KENT,10001,US PRESIDENT,JOSEPH R BIDEN JR,DEMOCRAT,44552,87025,20220315,TOTAL",
            "2020,DELAWARE,DE,KENT,10001,US PRESIDENT,DONALD J TRUMP,REPUBLICAN,41009,87025,20220315,TOTAL",
            // Filtered: no FIPS, zero total.
            "2020,MAINE,ME,MAINE UOCAVA,,US PRESIDENT,JOSEPH R BIDEN JR,DEMOCRAT,100,200,20220315,TOTAL",
            "2020,ALASKA,AK,DISTRICT 99,2099,US PRESIDENT,DONALD J TRUMP,REPUBLICAN,0,0,20220315,TOTAL",
        ]);

        let results = process_mit_csv(data.as_bytes()).unwrap();
        assert_eq!(results.len(), 2);

        let autauga = &results[0];
        assert_eq!(autauga.fips, "01001");
        assert_eq!(autauga.state_po, "AL");
        assert_eq!(autauga.year, 2020);
        assert_eq!(autauga.votes_dem, 9_000);
        assert_eq!(autauga.votes_rep, 15_770);
        assert_eq!(autauga.votes_all, 27_770);
        // 9000 / 27770 = 32.4090...; 15770 / 27770 = 56.7879...
        assert!((autauga.dem_pct - 32.41).abs() < 1e-9);
        assert!((autauga.rep_pct - 56.79).abs() < 1e-9);
        assert!((autauga.margin.unwrap() - 24.38).abs() < 1e-9);
        assert_eq!(autauga.winner, Winner::Rep);

        let kent = &results[1];
        assert_eq!(kent.fips, "10001");
        assert_eq!(kent.votes_all, 87_025);
        // 44552 / 87025 = 51.1945...; 41009 / 87025 = 47.1232...
        assert!((kent.dem_pct - 51.19).abs() < 1e-9);
        assert!((kent.rep_pct - 47.12).abs() < 1e-9);
        assert_eq!(kent.winner, Winner::Dem);

        for r in &results {
            assert!(r.votes_dem + r.votes_rep <= r.votes_all);
        }
    }

    #[test]
    fn equal_votes_are_a_tie() {
        let data = csv(&[
            "2016,TEXAS,TX,LOVING,48301,US PRESIDENT,HILLARY CLINTON,DEMOCRAT,50,100,20191113,TOTAL",
            "2016,TEXAS,TX,LOVING,48301,US PRESIDENT,DONALD TRUMP,REPUBLICAN,50,100,20191113,TOTAL",
        ]);
        let results = process_mit_csv(data.as_bytes()).unwrap();
        assert_eq!(results[0].winner, Winner::Tie);
        assert!(results[0].margin.unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_votes_count_as_zero() {
        let data = csv(&[
            "2000,OHIO,OH,ADAMS,39001,US PRESIDENT,AL GORE,DEMOCRAT,NA,1000,20191113,TOTAL",
            "2000,OHIO,OH,ADAMS,39001,US PRESIDENT,GEORGE W. BUSH,REPUBLICAN,600,1000,20191113,TOTAL",
        ]);
        let results = process_mit_csv(data.as_bytes()).unwrap();
        assert_eq!(results[0].votes_dem, 0);
        assert_eq!(results[0].votes_rep, 600);
        assert!((results[0].rep_pct - 60.0).abs() < 1e-9);
    }

    #[test]
    fn total_falls_back_to_republican_column() {
        let data = csv(&[
            "2004,TEXAS,TX,KING,48269,US PRESIDENT,GEORGE W. BUSH,REPUBLICAN,150,160,20191113,TOTAL",
        ]);
        let results = process_mit_csv(data.as_bytes()).unwrap();
        assert_eq!(results[0].votes_all, 160);
        assert_eq!(results[0].votes_dem, 0);
    }

    #[test]
    fn normalizes_candidate_names() {
        assert_eq!(normalize_candidate("JOSEPH R BIDEN JR"), "JOE BIDEN");
        assert_eq!(normalize_candidate("DONALD J TRUMP"), "DONALD TRUMP");
        assert_eq!(normalize_candidate("AL GORE"), "AL GORE");
    }

    fn scraped(fips: &str, dem: f64, rep: f64) -> CountyResult {
        CountyResult {
            fips: fips.to_string(),
            county_name: "X".to_string(),
            state_po: "AL".to_string(),
            year: 2024,
            votes_dem: 0,
            votes_rep: 0,
            votes_all: 0,
            dem_pct: dem,
            rep_pct: rep,
            margin: None,
            winner: Winner::from_shares_dem_on_tie(dem, rep),
        }
    }

    #[test]
    fn merge_rescales_and_keeps_last_duplicate() {
        let first = scraped("01001", 0.3, 0.6);
        let second = scraped("01001", 0.2505, 0.7312);
        let other = scraped("01003", 0.5, 0.5);

        let merged = merge_later_results(Vec::new(), vec![first, other, second]);
        assert_eq!(merged.len(), 2);

        assert_eq!(merged[0].fips, "01003");
        let autauga = &merged[1];
        assert!((autauga.dem_pct - 25.05).abs() < 1e-9);
        assert!((autauga.rep_pct - 73.12).abs() < 1e-9);
        assert!((autauga.margin.unwrap() - 48.07).abs() < 1e-9);
    }

    #[test]
    fn dedup_keeps_distinct_years() {
        let mut a = scraped("01001", 0.3, 0.6);
        a.year = 2020;
        let b = scraped("01001", 0.3, 0.6);
        assert_eq!(dedup_keep_last(vec![a, b]).len(), 2);
    }
}
