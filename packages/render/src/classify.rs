//! Color classification and legend helpers.
//!
//! Winner shares on the 0–100 scale fall into seven buckets:
//! `<50, [50,55), [55,60), [60,65), [65,70), [70,80), [80,100]`. Each
//! party has a seven-step ramp, lightest first.

use election_atlas_results_models::Winner;

/// Lower edges of buckets 1 through 6.
pub const BREAKS: [f64; 6] = [50.0, 55.0, 60.0, 65.0, 70.0, 80.0];

/// Republican ramp, one color per bucket.
pub const REP_RAMP: [&str; 7] = [
    "#ffeae3", "#ffd3c3", "#f89a8b", "#e6655a", "#c52622", "#9a040b", "#670000",
];

/// Democratic ramp, one color per bucket.
pub const DEM_RAMP: [&str; 7] = [
    "#e2f4fc", "#bbe6f8", "#8cc8f6", "#5194c3", "#166296", "#01446d", "#042853",
];

/// Marker color for Republican wins.
pub const REP_COLOR: &str = "#c52622";

/// Marker color for Democratic wins.
pub const DEM_COLOR: &str = "#5194c3";

/// Background fill for land without data.
pub const LAND_COLOR: &str = "#e9e9e9";

/// Returns the bucket for a share on the 0–100 scale.
#[must_use]
pub fn bucket_index(pct: f64) -> usize {
    BREAKS.iter().take_while(|edge| pct >= **edge).count()
}

/// Returns the ramp for a winner, if it has one.
#[must_use]
pub const fn ramp(winner: Winner) -> Option<&'static [&'static str; 7]> {
    match winner {
        Winner::Dem => Some(&DEM_RAMP),
        Winner::Rep => Some(&REP_RAMP),
        Winner::Tie => None,
    }
}

/// Fill for a county carried by `winner` with `pct` of the vote.
///
/// Ties have no fill.
#[must_use]
pub fn fill_color(winner: Winner, pct: f64) -> Option<&'static str> {
    ramp(winner).map(|r| r[bucket_index(pct)])
}

/// Marker color: red for Republican wins, blue otherwise.
#[must_use]
pub const fn party_color(winner: Winner) -> &'static str {
    match winner {
        Winner::Rep => REP_COLOR,
        Winner::Dem | Winner::Tie => DEM_COLOR,
    }
}

/// Rounds a vote count to a legend-friendly value.
///
/// Values of at least a million round to the nearest million, at least
/// 100k to the nearest 100k, at least 10k to the nearest 10k, and anything
/// smaller to the nearest thousand.
#[must_use]
pub fn nice_round(value: f64) -> f64 {
    let step = if value >= 1_000_000.0 {
        1_000_000.0
    } else if value >= 100_000.0 {
        100_000.0
    } else if value >= 10_000.0 {
        10_000.0
    } else {
        1_000.0
    };
    (value / step).round_ties_even() * step
}

/// Formats a vote count as `5M`, `500k`, or the plain number.
#[must_use]
pub fn format_votes(votes: f64) -> String {
    if votes >= 1_000_000.0 {
        format!("{:.0}M", votes / 1_000_000.0)
    } else if votes >= 1_000.0 {
        format!("{:.0}k", votes / 1_000.0)
    } else {
        format!("{votes:.0}")
    }
}

/// Linearly maps `value` from `[min, max]` onto `[out_min, out_max]`.
///
/// When the input range is empty every value maps to the output midpoint.
#[must_use]
pub fn scale_between(value: f64, min: f64, max: f64, out_min: f64, out_max: f64) -> f64 {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        return f64::midpoint(out_min, out_max);
    }
    out_min + (out_max - out_min) * ((value - min) / span)
}

/// Minimum and maximum of a set of values, or `None` if empty.
#[must_use]
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Legend entries for a proportional-symbol map.
///
/// Thresholds sit at 25%, 50%, and 100% of the value range, each rounded
/// with [`nice_round`]. Returns `(value, marker_area)` pairs.
#[must_use]
pub fn symbol_legend(min: f64, max: f64, area_min: f64, area_max: f64) -> Vec<(f64, f64)> {
    let range = max - min;
    [min + range * 0.25, min + range * 0.5, max]
        .into_iter()
        .map(nice_round)
        .map(|v| (v, scale_between(v, min, max, area_min, area_max)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_follow_breaks() {
        assert_eq!(bucket_index(12.0), 0);
        assert_eq!(bucket_index(49.99), 0);
        assert_eq!(bucket_index(50.0), 1);
        assert_eq!(bucket_index(54.99), 1);
        assert_eq!(bucket_index(55.0), 2);
        assert_eq!(bucket_index(64.0), 3);
        assert_eq!(bucket_index(69.9), 4);
        assert_eq!(bucket_index(70.0), 5);
        assert_eq!(bucket_index(79.9), 5);
        assert_eq!(bucket_index(80.0), 6);
        assert_eq!(bucket_index(100.0), 6);
    }

    #[test]
    fn fill_uses_winner_ramp() {
        assert_eq!(fill_color(Winner::Rep, 72.0), Some(REP_RAMP[5]));
        assert_eq!(fill_color(Winner::Dem, 51.0), Some(DEM_RAMP[1]));
        assert_eq!(fill_color(Winner::Tie, 50.0), None);
        assert_eq!(party_color(Winner::Tie), DEM_COLOR);
    }

    #[test]
    fn nice_round_by_magnitude() {
        assert!((nice_round(2_600_000.0) - 3_000_000.0).abs() < f64::EPSILON);
        assert!((nice_round(349_000.0) - 300_000.0).abs() < f64::EPSILON);
        assert!((nice_round(45_100.0) - 50_000.0).abs() < f64::EPSILON);
        assert!((nice_round(7_400.0) - 7_000.0).abs() < f64::EPSILON);
        assert!(nice_round(400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_vote_labels() {
        assert_eq!(format_votes(5_000_000.0), "5M");
        assert_eq!(format_votes(500_000.0), "500k");
        assert_eq!(format_votes(999.0), "999");
    }

    #[test]
    fn scale_handles_empty_range() {
        assert!((scale_between(5.0, 5.0, 5.0, 1.0, 500.0) - 250.5).abs() < f64::EPSILON);
        assert!((scale_between(0.0, 0.0, 10.0, 1.0, 500.0) - 1.0).abs() < f64::EPSILON);
        assert!((scale_between(10.0, 0.0, 10.0, 1.0, 500.0) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn legend_thresholds_are_rounded() {
        let legend = symbol_legend(0.0, 1_000_000.0, 1.0, 500.0);
        let values: Vec<f64> = legend.iter().map(|(v, _)| *v).collect();
        // 250k rounds half to even.
        assert_eq!(values, vec![200_000.0, 500_000.0, 1_000_000.0]);
        assert!((legend[2].1 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn extent_of_values() {
        assert_eq!(extent([3.0, 1.0, 2.0]), Some((1.0, 3.0)));
        assert_eq!(extent(std::iter::empty()), None);
    }
}
