//! County shift map: one arrow per county pointing toward the party that
//! gained margin between two elections.

use std::path::PathBuf;

use election_atlas_results_models::CountyChange;

use crate::boundaries::{BoundaryLayer, GeoJoinedRow};
use crate::classify::{DEM_COLOR, LAND_COLOR, REP_COLOR, extent, scale_between};
use crate::svg::{SvgDocument, draw_polygons, map_viewport, write_png};
use crate::{OutputDirs, RenderError, layer_bounds};

/// Canvas width.
pub const WIDTH: u32 = 1200;
/// Canvas height.
pub const HEIGHT: u32 = 800;

/// Arrow length range in pixels.
pub const ARROW_LENGTH: (f64, f64) = (1.0, 30.0);

/// Direction and color of a shift arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    /// Angle from the positive x axis, counter-clockwise, in degrees.
    pub angle: f64,
    /// Stroke color.
    pub color: &'static str,
}

/// Heading for a margin change. Negative changes moved toward the
/// Democrats and point up-left.
#[must_use]
pub fn heading(margin_diff: f64) -> Heading {
    if margin_diff < 0.0 {
        Heading {
            angle: 135.0,
            color: DEM_COLOR,
        }
    } else {
        Heading {
            angle: 45.0,
            color: REP_COLOR,
        }
    }
}

/// Screen-space end of an arrow starting at `(x, y)`.
#[must_use]
pub fn arrow_tip(x: f64, y: f64, length: f64, heading: Heading) -> (f64, f64) {
    let theta = heading.angle.to_radians();
    (theta.cos().mul_add(length, x), theta.sin().mul_add(-length, y))
}

/// Path of the shift map for a year pair.
#[must_use]
pub fn shift_path(dirs: &OutputDirs, from: u16, to: u16) -> PathBuf {
    dirs.visuals.join(format!("county_shift_{from}_{to}.png"))
}

/// Renders arrows sized by the absolute margin change.
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if the state layer is empty.
pub fn build_shift_svg(
    from: u16,
    to: u16,
    joined: &[GeoJoinedRow<'_, CountyChange>],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<String, RenderError> {
    let viewport = map_viewport(layer_bounds(states)?, WIDTH, HEIGHT);
    let (min, max) = extent(joined.iter().map(|j| j.row.margin_diff.abs())).unwrap_or_default();
    let (len_min, len_max) = ARROW_LENGTH;

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!(
        "County-level shift in presidential vote share, {from} to {to}\nArrows indicate shift direction; larger symbols represent greater shifts"
    ));
    draw_polygons(&mut doc, &viewport, counties.geometries(), LAND_COLOR, "#d1f1d1", 0.2);
    draw_polygons(&mut doc, &viewport, states.geometries(), "none", "#ffffff", 1.0);

    for j in joined {
        let Some(centroid) = j.centroid() else {
            continue;
        };
        let toward = heading(j.row.margin_diff);
        let length = scale_between(j.row.margin_diff.abs(), min, max, len_min, len_max);
        let start = viewport.to_screen(centroid.x(), centroid.y());
        doc.arrow(start, arrow_tip(start.0, start.1, length, toward), toward.color, 1.0);
    }

    let y = f64::from(HEIGHT) - 60.0;
    for (i, (label, diff)) in [("More Democratic", -1.0), ("More Republican", 1.0)]
        .into_iter()
        .enumerate()
    {
        #[allow(clippy::cast_precision_loss)]
        let x = (i as f64).mul_add(180.0, 40.0);
        let toward = heading(diff);
        let start = (x + 12.0, y + 8.0);
        doc.arrow(start, arrow_tip(start.0, start.1, 16.0, toward), toward.color, 1.5);
        doc.text(x + 34.0, y + 4.0, 12.0, "start", "normal", label);
    }

    Ok(doc.finish())
}

/// Writes the shift map for one year pair.
///
/// # Errors
///
/// Returns [`RenderError`] if the map cannot be built or written.
pub fn write_shift(
    dirs: &OutputDirs,
    from: u16,
    to: u16,
    changes: &[CountyChange],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<PathBuf, RenderError> {
    let joined = counties.join(changes, |c| c.fips.as_str());
    log::info!("{from}-{to}: {} county shifts joined to boundaries", joined.len());

    let path = shift_path(dirs, from, to);
    write_png(&path, &build_shift_svg(from, to, &joined, counties, states)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use election_atlas_results_models::{CountyResult, Winner};

    use super::*;
    use crate::test_fixtures::{layers, temp_dirs};

    fn snapshot(year: u16, dem_pct: f64, rep_pct: f64) -> CountyResult {
        CountyResult {
            fips: "20001".to_string(),
            county_name: "ALLEN".to_string(),
            state_po: "KS".to_string(),
            year,
            votes_dem: 0,
            votes_rep: 0,
            votes_all: 0,
            dem_pct,
            rep_pct,
            margin: Some(rep_pct - dem_pct),
            winner: Winner::from_shares(dem_pct, rep_pct),
        }
    }

    fn change(fips: &str, margin_diff: f64) -> CountyChange {
        CountyChange {
            fips: fips.to_string(),
            county_name: "ALLEN".to_string(),
            state_po: "KS".to_string(),
            before: snapshot(2016, 40.0, 60.0),
            after: snapshot(2020, 40.0, 60.0),
            dem_pct_diff: 0.0,
            rep_pct_diff: 0.0,
            margin_diff,
            flipped: false,
        }
    }

    #[test]
    fn heading_by_sign() {
        assert_eq!(heading(-0.5).color, DEM_COLOR);
        assert!((heading(-0.5).angle - 135.0).abs() < f64::EPSILON);
        assert_eq!(heading(0.0).color, REP_COLOR);
        assert!((heading(3.0).angle - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn arrow_tips_point_up() {
        let (x, y) = arrow_tip(100.0, 100.0, 10.0, heading(-1.0));
        assert!(x < 100.0 && y < 100.0);
        let (x, y) = arrow_tip(100.0, 100.0, 10.0, heading(1.0));
        assert!(x > 100.0 && y < 100.0);
    }

    #[test]
    fn draws_one_arrow_per_joined_county() {
        let (counties, states) = layers();
        let changes = vec![change("20001", -20.0), change("20003", 4.0), change("99999", 1.0)];
        let joined = counties.join(&changes, |c| c.fips.as_str());
        let svg = build_shift_svg(2016, 2020, &joined, &counties, &states).unwrap();

        assert!(svg.contains("County-level shift in presidential vote share, 2016 to 2020"));
        assert!(svg.contains("More Democratic"));
        // Two counties plus two legend arrows.
        assert_eq!(svg.matches("<line").count(), 4);
    }

    #[test]
    fn writes_pair_file() {
        let (root, dirs) = temp_dirs("shift");
        let (counties, states) = layers();
        let path = write_shift(&dirs, 2020, 2024, &[change("20001", 2.0)], &counties, &states).unwrap();
        assert!(path.ends_with("county_shift_2020_2024.png"));
        assert!(path.exists());
        std::fs::remove_dir_all(root).unwrap();
    }
}
