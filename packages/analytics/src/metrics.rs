//! Per-year aggregates of counties won by each party.

use std::collections::BTreeMap;

use election_atlas_results_models::{CountyResultWithPopulation, ElectionMetrics};

#[derive(Debug, Default)]
struct PartySet {
    counties: u64,
    population: u64,
    white_weighted: f64,
}

impl PartySet {
    #[allow(clippy::cast_precision_loss)]
    fn add(&mut self, row: &CountyResultWithPopulation) {
        self.counties += 1;
        if let Some(pop) = row.population {
            self.population += pop;
            if let Some(pct) = row.white_alone_pct {
                self.white_weighted += pct * pop as f64;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn weighted_white_pct(&self) -> Option<f64> {
        ratio_f64(self.white_weighted, self.population as f64)
    }
}

/// Computes [`ElectionMetrics`] for every year, in ascending order.
///
/// A county counts as Republican when it has strictly more Republican than
/// Democratic votes, and as Democratic otherwise. Missing population
/// contributes nothing to any sum.
#[must_use]
pub fn compute_metrics(rows: &[CountyResultWithPopulation]) -> Vec<ElectionMetrics> {
    let mut by_year: BTreeMap<u16, (PartySet, PartySet)> = BTreeMap::new();
    for row in rows {
        let (rep, dem) = by_year.entry(row.result.year).or_default();
        if row.result.votes_rep > row.result.votes_dem {
            rep.add(row);
        } else {
            dem.add(row);
        }
    }

    by_year
        .into_iter()
        .map(|(year, (rep, dem))| {
            let counties = rep.counties + dem.counties;
            let population = rep.population + dem.population;
            log::debug!("{year}: {counties} counties, population {population}");

            ElectionMetrics {
                year,
                num_r_counties: rep.counties,
                num_d_counties: dem.counties,
                share_r_counties: ratio(rep.counties, counties),
                share_d_counties: ratio(dem.counties, counties),
                pop_r_counties: rep.population,
                pop_d_counties: dem.population,
                share_r_population: ratio(rep.population, population),
                share_d_population: ratio(dem.population, population),
                pct_white_r_counties: rep.weighted_white_pct(),
                pct_white_d_counties: dem.weighted_white_pct(),
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> Option<f64> {
    ratio_f64(part as f64, whole as f64)
}

fn ratio_f64(part: f64, whole: f64) -> Option<f64> {
    (whole > 0.0).then(|| part / whole)
}

#[cfg(test)]
mod tests {
    use election_atlas_results_models::{CountyResult, Winner};

    use super::*;

    fn row(
        year: u16,
        dem: u64,
        rep: u64,
        population: Option<u64>,
        white_pct: Option<f64>,
    ) -> CountyResultWithPopulation {
        CountyResultWithPopulation {
            result: CountyResult {
                fips: "01001".to_string(),
                county_name: "X".to_string(),
                state_po: "AL".to_string(),
                year,
                votes_dem: dem,
                votes_rep: rep,
                votes_all: dem + rep,
                dem_pct: 0.0,
                rep_pct: 0.0,
                margin: None,
                // Deliberately inconsistent: metrics use vote counts.
                winner: Winner::Tie,
            },
            population,
            white_alone: None,
            white_alone_pct: white_pct,
        }
    }

    #[test]
    fn aggregates_by_vote_counts() {
        let rows = vec![
            row(2020, 10, 20, Some(1000), Some(80.0)),
            row(2020, 10, 30, Some(3000), Some(60.0)),
            row(2020, 50, 10, Some(6000), Some(40.0)),
            row(2020, 5, 5, None, None),
        ];
        let m = &compute_metrics(&rows)[0];

        assert_eq!(m.year, 2020);
        assert_eq!(m.num_r_counties, 2);
        // The 5/5 tie counts as Democratic.
        assert_eq!(m.num_d_counties, 2);
        assert!((m.share_r_counties.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(m.pop_r_counties, 4000);
        assert_eq!(m.pop_d_counties, 6000);
        assert!((m.share_r_population.unwrap() - 0.4).abs() < 1e-12);
        // (80 * 1000 + 60 * 3000) / 4000 = 65
        assert!((m.pct_white_r_counties.unwrap() - 65.0).abs() < 1e-9);
        assert!((m.pct_white_d_counties.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn zero_population_gives_null_ratios() {
        let rows = vec![row(2000, 1, 2, None, None)];
        let m = &compute_metrics(&rows)[0];
        assert_eq!(m.num_r_counties, 1);
        assert!(m.share_r_population.is_none());
        assert!(m.pct_white_r_counties.is_none());
        assert!(m.pct_white_d_counties.is_none());
        assert!((m.share_r_counties.unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn years_come_out_ascending() {
        let rows = vec![row(2024, 1, 2, None, None), row(2000, 1, 2, None, None)];
        let years: Vec<u16> = compute_metrics(&rows).iter().map(|m| m.year).collect();
        assert_eq!(years, vec![2000, 2024]);
    }
}
