//! Proportional-symbol maps: one circle per county or state, placed at the
//! centroid and colored by the winning party.

use std::path::PathBuf;

use election_atlas_results_models::{CountyResultWithPopulation, StateResult, Winner};
use geo::Point;

use crate::boundaries::{BoundaryLayer, GeoJoinedRow};
use crate::classify::{
    DEM_COLOR, LAND_COLOR, REP_COLOR, extent, format_votes, nice_round, party_color,
    scale_between, symbol_legend,
};
use crate::svg::{SvgDocument, Viewport, draw_polygons, map_viewport, marker_radius, write_png};
use crate::{OutputDirs, RenderError, group_by_year, layer_bounds};

/// Canvas width.
pub const WIDTH: u32 = 1200;
/// Canvas height.
pub const HEIGHT: u32 = 800;

/// Marker area range for county winner votes.
pub const COUNTY_AREA: (f64, f64) = (1.0, 500.0);
/// Marker area range for state winner votes.
pub const STATE_AREA: (f64, f64) = (50.0, 2000.0);
/// Turnout marker area per square-rooted vote.
pub const TURNOUT_FACTOR: f64 = 0.08;

const SYMBOL_OPACITY: f64 = 0.7;

/// A marker before it is drawn.
#[derive(Debug, Clone, Copy)]
struct Symbol {
    at: Point<f64>,
    area: f64,
    color: &'static str,
}

/// Draws markers largest first so small ones stay visible.
fn draw_symbols(doc: &mut SvgDocument, viewport: &Viewport, mut symbols: Vec<Symbol>) {
    symbols.sort_by(|a, b| b.area.total_cmp(&a.area));
    for symbol in symbols {
        let (x, y) = viewport.to_screen(symbol.at.x(), symbol.at.y());
        doc.circle(x, y, marker_radius(symbol.area), symbol.color, SYMBOL_OPACITY);
    }
}

fn party_key(doc: &mut SvgDocument, x: f64, y: f64) {
    doc.circle(x, y, 6.0, REP_COLOR, SYMBOL_OPACITY);
    doc.text(x + 12.0, y + 4.0, 12.0, "start", "normal", "Republican");
    doc.circle(x, y + 20.0, 6.0, DEM_COLOR, SYMBOL_OPACITY);
    doc.text(x + 12.0, y + 24.0, 12.0, "start", "normal", "Democratic");
}

/// Draws a row of outlined circles labeled with their vote counts.
fn size_legend(doc: &mut SvgDocument, x: f64, y: f64, title: &str, entries: &[(f64, f64)]) {
    doc.text(x, y - 10.0, 12.0, "start", "bold", title);
    let mut cx = x;
    for &(value, area) in entries {
        let r = marker_radius(area);
        cx += r.max(6.0);
        doc.ring(cx, y + 20.0, r, "#555555");
        doc.text(cx, y + 28.0 + r, 11.0, "middle", "normal", &format_votes(value));
        cx += r.max(6.0) + 24.0;
    }
}

fn legend_origin() -> (f64, f64) {
    (40.0, f64::from(HEIGHT) - 80.0)
}

fn centroid_symbols<'a, T>(
    joined: &[GeoJoinedRow<'a, T>],
    mut symbol: impl FnMut(&'a T) -> (f64, &'static str),
) -> Vec<Symbol> {
    joined
        .iter()
        .filter_map(|j| {
            let at = j.centroid()?;
            let (area, color) = symbol(j.row);
            Some(Symbol { at, area, color })
        })
        .collect()
}

fn require_rows<T>(joined: &[GeoJoinedRow<'_, T>], what: &str, year: u16) -> Result<(), RenderError> {
    if joined.is_empty() {
        return Err(RenderError::Conversion {
            message: format!("no {what} joined to boundaries for {year}"),
        });
    }
    Ok(())
}

/// Path of the county winner-votes map for a year.
#[must_use]
pub fn county_symbols_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.visuals.join(format!("pres_county_symbols_{year}.png"))
}

/// Path of the county turnout map for a year.
#[must_use]
pub fn turnout_symbols_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.visuals
        .join(format!("pres_county_turnout_symbols_{year}.png"))
}

/// Path of the state winner-votes map for a year.
#[must_use]
pub fn state_symbols_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.visuals.join(format!("pres_state_symbols_{year}.png"))
}

/// Renders circles sized by the winner's votes in each county.
///
/// Areas are scaled linearly from the vote range into [`COUNTY_AREA`].
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if no county joined or the state
/// layer is empty.
pub fn build_county_symbols_svg(
    year: u16,
    joined: &[GeoJoinedRow<'_, CountyResultWithPopulation>],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<String, RenderError> {
    require_rows(joined, "counties", year)?;
    let viewport = map_viewport(layer_bounds(states)?, WIDTH, HEIGHT);

    #[allow(clippy::cast_precision_loss)]
    let votes = |r: &CountyResultWithPopulation| r.result.winner_votes() as f64;
    let (min, max) = extent(joined.iter().map(|j| votes(j.row))).unwrap_or_default();
    let (area_min, area_max) = COUNTY_AREA;

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!(
        "Presidential election results in {year}, by county\nLarger circles represent more votes received by the winner"
    ));
    draw_polygons(&mut doc, &viewport, states.geometries(), LAND_COLOR, "#ffffff", 1.0);
    draw_polygons(&mut doc, &viewport, counties.geometries(), "none", "#808080", 0.05);

    let symbols = centroid_symbols(joined, |r| {
        (
            scale_between(votes(r), min, max, area_min, area_max),
            party_color(r.result.winner),
        )
    });
    draw_symbols(&mut doc, &viewport, symbols);

    let (lx, ly) = legend_origin();
    size_legend(
        &mut doc,
        lx,
        ly,
        "Winner votes",
        &symbol_legend(min, max, area_min, area_max),
    );
    party_key(&mut doc, f64::from(WIDTH) - 160.0, ly);

    Ok(doc.finish())
}

/// Turnout marker area for a vote total.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn turnout_area(votes_all: u64) -> f64 {
    (votes_all as f64).sqrt() * TURNOUT_FACTOR
}

/// Renders circles sized by total votes cast in each county.
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if no county joined or the state
/// layer is empty.
pub fn build_turnout_symbols_svg(
    year: u16,
    joined: &[GeoJoinedRow<'_, CountyResultWithPopulation>],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<String, RenderError> {
    require_rows(joined, "counties", year)?;
    let viewport = map_viewport(layer_bounds(states)?, WIDTH, HEIGHT);

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!(
        "Presidential election results in {year}, by party and county.\nLarger circles represent more voters."
    ));
    draw_polygons(&mut doc, &viewport, states.geometries(), "none", "#808080", 0.3);
    draw_polygons(&mut doc, &viewport, counties.geometries(), "none", "#808080", 0.05);

    let symbols = centroid_symbols(joined, |r| {
        (turnout_area(r.result.votes_all), party_color(r.result.winner))
    });
    draw_symbols(&mut doc, &viewport, symbols);

    #[allow(clippy::cast_precision_loss)]
    let (min, max) = extent(joined.iter().map(|j| j.row.result.votes_all as f64)).unwrap_or_default();
    let range = max - min;
    let entries: Vec<(f64, f64)> = [min + range * 0.25, min + range * 0.5, max]
        .into_iter()
        .map(nice_round)
        .map(|v| (v, v.max(0.0).sqrt() * TURNOUT_FACTOR))
        .collect();

    let (lx, ly) = legend_origin();
    size_legend(&mut doc, lx, ly, "Votes cast", &entries);
    party_key(&mut doc, f64::from(WIDTH) - 160.0, ly);

    Ok(doc.finish())
}

/// Winner of a state by popular-vote share; ties go to the Republican.
#[must_use]
pub fn state_popular_winner(state: &StateResult) -> Winner {
    if state.d_pct > state.r_pct {
        Winner::Dem
    } else {
        Winner::Rep
    }
}

/// Popular votes received by the state's popular-vote winner.
#[must_use]
pub const fn state_winner_votes(state: &StateResult, winner: Winner) -> u64 {
    match winner {
        Winner::Dem => state.d_votes,
        Winner::Rep | Winner::Tie => state.r_votes,
    }
}

/// Renders circles sized by the winner's votes in each state.
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if no state joined.
pub fn build_state_symbols_svg(
    year: u16,
    joined: &[GeoJoinedRow<'_, StateResult>],
    states: &BoundaryLayer,
) -> Result<String, RenderError> {
    require_rows(joined, "states", year)?;
    let viewport = map_viewport(layer_bounds(states)?, WIDTH, HEIGHT);

    #[allow(clippy::cast_precision_loss)]
    let votes = |s: &StateResult| state_winner_votes(s, state_popular_winner(s)) as f64;
    let (min, max) = extent(joined.iter().map(|j| votes(j.row))).unwrap_or_default();
    let (area_min, area_max) = STATE_AREA;

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!("Presidential election results by state: {year}"));
    draw_polygons(&mut doc, &viewport, states.geometries(), LAND_COLOR, "#ffffff", 0.5);

    let symbols = centroid_symbols(joined, |s| {
        (
            scale_between(votes(s), min, max, area_min, area_max),
            party_color(state_popular_winner(s)),
        )
    });
    draw_symbols(&mut doc, &viewport, symbols);

    let (lx, ly) = legend_origin();
    size_legend(
        &mut doc,
        lx,
        ly,
        "Winner votes",
        &symbol_legend(min, max, area_min, area_max),
    );
    party_key(&mut doc, f64::from(WIDTH) - 160.0, ly);

    Ok(doc.finish())
}

/// Writes the county winner-votes and turnout maps for every year.
///
/// # Errors
///
/// Returns [`RenderError`] if a map cannot be built or written.
pub fn write_county_symbols(
    dirs: &OutputDirs,
    rows: &[CountyResultWithPopulation],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();

    for (year, year_rows) in group_by_year(rows, |r| r.result.year) {
        let joined = counties.join(year_rows, |r| r.result.fips.as_str());

        let path = county_symbols_path(dirs, year);
        write_png(&path, &build_county_symbols_svg(year, &joined, counties, states)?)?;
        written.push(path);

        let path = turnout_symbols_path(dirs, year);
        write_png(&path, &build_turnout_symbols_svg(year, &joined, counties, states)?)?;
        written.push(path);
    }

    Ok(written)
}

/// Writes a state winner-votes map for every year.
///
/// A year that fails is logged and skipped.
#[must_use]
pub fn write_state_symbols(
    dirs: &OutputDirs,
    rows: &[StateResult],
    states: &BoundaryLayer,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for (year, year_rows) in group_by_year(rows, |r| r.year) {
        let joined = states.join(year_rows, |r| r.state_fips.as_deref().unwrap_or(""));
        let path = state_symbols_path(dirs, year);

        match build_state_symbols_svg(year, &joined, states).and_then(|svg| write_png(&path, &svg))
        {
            Ok(()) => written.push(path),
            Err(e) => log::error!("Failed to render state symbols for {year}: {e}"),
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use election_atlas_results_models::CountyResult;

    use super::*;
    use crate::test_fixtures::{layers, temp_dirs};

    fn county(fips: &str, year: u16, votes_dem: u64, votes_rep: u64) -> CountyResultWithPopulation {
        let votes_all = votes_dem + votes_rep;
        #[allow(clippy::cast_precision_loss)]
        let pct = |v: u64| v as f64 / votes_all as f64 * 100.0;
        CountyResultWithPopulation {
            result: CountyResult {
                fips: fips.to_string(),
                county_name: "TEST".to_string(),
                state_po: "KS".to_string(),
                year,
                votes_dem,
                votes_rep,
                votes_all,
                dem_pct: pct(votes_dem),
                rep_pct: pct(votes_rep),
                margin: Some(pct(votes_rep) - pct(votes_dem)),
                winner: Winner::from_shares(pct(votes_dem), pct(votes_rep)),
            },
            population: None,
            white_alone: None,
            white_alone_pct: None,
        }
    }

    fn state(fips: Option<&str>, year: u16, d_pct: f64, r_pct: f64) -> StateResult {
        StateResult {
            state_fips: fips.map(str::to_string),
            state_name: "Kansas".to_string(),
            year,
            r_ev: 6,
            d_ev: 0,
            total_votes: 1_000,
            r_votes: 560,
            d_votes: 410,
            other_votes: 30,
            r_pct,
            d_pct,
            o_pct: 3.0,
            winner: Winner::Rep,
        }
    }

    #[test]
    fn county_symbols_colored_by_winner() {
        let (counties, states) = layers();
        let rows = vec![county("20001", 2020, 100, 900), county("20003", 2020, 5_000, 1_000)];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        let svg = build_county_symbols_svg(2020, &joined, &counties, &states).unwrap();

        assert!(svg.contains("Presidential election results in 2020, by county"));
        assert!(svg.contains(&format!(r#"fill="{REP_COLOR}" fill-opacity"#)));
        assert!(svg.contains(&format!(r#"fill="{DEM_COLOR}" fill-opacity"#)));
        assert!(svg.contains("Winner votes"));
        // Two data markers plus two in the party key.
        assert_eq!(svg.matches("fill-opacity=\"0.7\"").count(), 4);
    }

    #[test]
    fn largest_marker_drawn_first() {
        let (counties, states) = layers();
        let rows = vec![county("20001", 2020, 100, 900), county("20003", 2020, 5_000, 1_000)];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        let svg = build_county_symbols_svg(2020, &joined, &counties, &states).unwrap();

        let big = svg.find(&format!(r#"fill="{DEM_COLOR}" fill-opacity"#)).unwrap();
        let small = svg.find(&format!(r#"fill="{REP_COLOR}" fill-opacity"#)).unwrap();
        assert!(big < small);
    }

    #[test]
    fn turnout_area_uses_square_root() {
        assert!((turnout_area(1_000_000) - 80.0).abs() < 1e-9);
        assert!(turnout_area(0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_join_is_an_error() {
        let (counties, states) = layers();
        let rows = vec![county("99999", 2020, 1, 2)];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        assert!(matches!(
            build_turnout_symbols_svg(2020, &joined, &counties, &states),
            Err(RenderError::Conversion { .. })
        ));
    }

    #[test]
    fn state_winner_follows_popular_share() {
        let s = state(Some("20"), 2020, 41.0, 56.0);
        assert_eq!(state_popular_winner(&s), Winner::Rep);
        assert_eq!(state_winner_votes(&s, Winner::Rep), 560);

        let tie = state(Some("20"), 2020, 50.0, 50.0);
        assert_eq!(state_popular_winner(&tie), Winner::Rep);

        let dem = state(Some("20"), 2020, 51.0, 49.0);
        assert_eq!(state_popular_winner(&dem), Winner::Dem);
    }

    #[test]
    fn failing_state_year_is_skipped() {
        let (root, dirs) = temp_dirs("state_symbols");
        let (_, states) = layers();
        let rows = vec![
            state(Some("20"), 2016, 36.0, 57.0),
            // No FIPS: nothing joins, so this year fails.
            state(None, 2020, 41.0, 56.0),
        ];

        let written = write_state_symbols(&dirs, &rows, &states);
        assert_eq!(written, vec![state_symbols_path(&dirs, 2016)]);
        assert!(written[0].exists());
        assert!(!state_symbols_path(&dirs, 2020).exists());

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn writes_both_county_maps() {
        let (root, dirs) = temp_dirs("county_symbols");
        let (counties, states) = layers();
        let rows = vec![county("20001", 2024, 10, 20)];

        let written = write_county_symbols(&dirs, &rows, &counties, &states).unwrap();
        assert_eq!(
            written,
            vec![county_symbols_path(&dirs, 2024), turnout_symbols_path(&dirs, 2024)]
        );

        std::fs::remove_dir_all(root).unwrap();
    }
}
