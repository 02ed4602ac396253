//! County population against white alone share, one chart per year.

use std::path::PathBuf;

use election_atlas_results_models::{CountyResultWithPopulation, Winner};

use crate::classify::{DEM_COLOR, REP_COLOR, extent, format_votes, party_color, scale_between};
use crate::svg::{SvgDocument, marker_radius, write_png};
use crate::{OutputDirs, RenderError, group_by_year};

/// Canvas width.
pub const WIDTH: u32 = 800;
/// Canvas height.
pub const HEIGHT: u32 = 500;

/// Marker area range, scaled by population.
pub const MARKER_AREA: (f64, f64) = (10.0, 200.0);

const PLOT_LEFT: f64 = 80.0;
const PLOT_TOP: f64 = 70.0;
const PLOT_RIGHT: f64 = 160.0;
const PLOT_BOTTOM: f64 = 60.0;

/// One plotted county.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    /// White alone share, 0–100.
    pub white_alone_pct: f64,
    /// Total population.
    pub population: f64,
    /// Winning party.
    pub winner: Winner,
}

/// Extracts plottable points. Rows without population data are skipped.
#[must_use]
pub fn scatter_points<'a>(
    rows: impl IntoIterator<Item = &'a CountyResultWithPopulation>,
) -> Vec<ScatterPoint> {
    rows.into_iter()
        .filter_map(|r| {
            #[allow(clippy::cast_precision_loss)]
            let population = r.population? as f64;
            Some(ScatterPoint {
                white_alone_pct: r.white_alone_pct?,
                population,
                winner: r.result.winner,
            })
        })
        .collect()
}

/// Smallest value of the form `k × 10^n` (k = 1..=10) at or above `value`.
#[must_use]
pub fn nice_ceil(value: f64) -> f64 {
    if value <= 0.0 {
        return 1.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let step = 10f64.powi(value.log10().floor() as i32);
    (value / step).ceil() * step
}

/// Path of the scatter chart for a year.
#[must_use]
pub fn scatter_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.visuals
        .join(format!("presidential_pop_scatter_{year}.png"))
}

/// Renders the scatter chart.
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if there are no points.
pub fn build_scatter_svg(year: u16, points: &[ScatterPoint]) -> Result<String, RenderError> {
    let Some((pop_min, pop_max)) = extent(points.iter().map(|p| p.population)) else {
        return Err(RenderError::Conversion {
            message: format!("no counties with population data for {year}"),
        });
    };

    let plot_w = f64::from(WIDTH) - PLOT_LEFT - PLOT_RIGHT;
    let plot_h = f64::from(HEIGHT) - PLOT_TOP - PLOT_BOTTOM;
    let plot_bottom = PLOT_TOP + plot_h;
    let y_max = nice_ceil(pop_max);
    let sx = |pct: f64| (pct.clamp(0.0, 100.0) / 100.0).mul_add(plot_w, PLOT_LEFT);
    let sy = |pop: f64| (-pop / y_max).mul_add(plot_h, plot_bottom);

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!(
        "County population vs. % White alone, by winning party and election in {year}"
    ));

    for i in 0..=5_u8 {
        let pct = f64::from(i) * 20.0;
        let x = sx(pct);
        doc.line((x, PLOT_TOP), (x, plot_bottom), "#eeeeee", 1.0);
        doc.text(x, plot_bottom + 16.0, 11.0, "middle", "normal", &format!("{pct:.0}"));
    }
    for i in 0..=4_u8 {
        let pop = y_max * f64::from(i) / 4.0;
        let y = sy(pop);
        doc.line((PLOT_LEFT, y), (PLOT_LEFT + plot_w, y), "#eeeeee", 1.0);
        doc.text(PLOT_LEFT - 8.0, y + 4.0, 11.0, "end", "normal", &format_votes(pop));
    }
    doc.line((PLOT_LEFT, plot_bottom), (PLOT_LEFT + plot_w, plot_bottom), "#333333", 1.0);
    doc.line((PLOT_LEFT, PLOT_TOP), (PLOT_LEFT, plot_bottom), "#333333", 1.0);
    doc.text(
        PLOT_LEFT + plot_w / 2.0,
        f64::from(HEIGHT) - 16.0,
        12.0,
        "middle",
        "normal",
        "% White alone population",
    );
    doc.text(20.0, PLOT_TOP - 12.0, 12.0, "start", "normal", "Total population");

    let (area_min, area_max) = MARKER_AREA;
    for p in points {
        let area = scale_between(p.population, pop_min, pop_max, area_min, area_max);
        doc.circle(
            sx(p.white_alone_pct),
            sy(p.population),
            marker_radius(area),
            party_color(p.winner),
            0.6,
        );
    }

    let lx = f64::from(WIDTH) - PLOT_RIGHT + 20.0;
    doc.text(lx, PLOT_TOP, 12.0, "start", "bold", "Winner");
    doc.circle(lx + 6.0, PLOT_TOP + 18.0, 6.0, REP_COLOR, 0.6);
    doc.text(lx + 18.0, PLOT_TOP + 22.0, 12.0, "start", "normal", "Republican");
    doc.circle(lx + 6.0, PLOT_TOP + 38.0, 6.0, DEM_COLOR, 0.6);
    doc.text(lx + 18.0, PLOT_TOP + 42.0, 12.0, "start", "normal", "Democratic");

    Ok(doc.finish())
}

/// Writes one scatter chart per year that has population data.
///
/// # Errors
///
/// Returns [`RenderError::Io`] if a chart cannot be written.
pub fn write_scatters(
    dirs: &OutputDirs,
    rows: &[CountyResultWithPopulation],
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();

    for (year, year_rows) in group_by_year(rows, |r| r.result.year) {
        let points = scatter_points(year_rows);
        if points.is_empty() {
            log::warn!("{year}: no counties with population data, skipping scatter");
            continue;
        }

        let path = scatter_path(dirs, year);
        write_png(&path, &build_scatter_svg(year, &points)?)?;
        written.push(path);
    }

    Ok(written)
}
