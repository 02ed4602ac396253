//! County choropleths colored by the winner's share, with `GeoJSON`
//! sidecars of the joined data.

use std::path::PathBuf;

use election_atlas_results_models::CountyResultWithPopulation;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;

use crate::boundaries::{Boundary, BoundaryLayer, GeoJoinedRow};
use crate::classify::{BREAKS, DEM_RAMP, REP_RAMP, fill_color};
use crate::svg::{SvgDocument, draw_polygons, map_viewport, write_png};
use crate::{OutputDirs, RenderError, group_by_year, layer_bounds, write_json};

/// Canvas width.
pub const WIDTH: u32 = 1200;
/// Canvas height.
pub const HEIGHT: u32 = 800;

/// Path of the choropleth image for a year.
#[must_use]
pub fn image_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.visuals.join(format!("presidential_results_{year}.png"))
}

/// Path of the joined county `GeoJSON` for a year.
#[must_use]
pub fn geojson_path(dirs: &OutputDirs, year: u16) -> PathBuf {
    dirs.geo.join(format!("presidential_election_{year}.geojson"))
}

/// Path of the state outline `GeoJSON`.
#[must_use]
pub fn states_geojson_path(dirs: &OutputDirs) -> PathBuf {
    dirs.geo.join("states.geojson")
}

/// Renders one year's choropleth.
///
/// Counties are filled through the winner's ramp; ties are left unfilled.
/// State outlines are drawn on top.
///
/// # Errors
///
/// Returns [`RenderError::Conversion`] if the state layer is empty.
pub fn build_choropleth_svg(
    year: u16,
    counties: &[GeoJoinedRow<'_, CountyResultWithPopulation>],
    states: &BoundaryLayer,
) -> Result<String, RenderError> {
    let viewport = map_viewport(layer_bounds(states)?, WIDTH, HEIGHT);
    let mut doc = SvgDocument::new(WIDTH, HEIGHT);
    doc.title(&format!("Presidential Election Results by County - {year}"));

    for joined in counties {
        let result = &joined.row.result;
        let fill = result
            .winner_pct()
            .and_then(|pct| fill_color(result.winner, pct))
            .unwrap_or("none");
        doc.path(
            &viewport.path_data(joined.projected),
            fill,
            "#ffffff",
            0.1,
        );
    }
    draw_polygons(&mut doc, &viewport, states.geometries(), "none", "#000000", 0.5);

    let legend_y = f64::from(HEIGHT) - 70.0;
    let center = f64::from(WIDTH) / 2.0;
    colorbar(&mut doc, center - 340.0, legend_y, "Republican %", &REP_RAMP);
    colorbar(&mut doc, center + 40.0, legend_y, "Democratic %", &DEM_RAMP);

    Ok(doc.finish())
}

fn colorbar(doc: &mut SvgDocument, x: f64, y: f64, label: &str, ramp: &[&str; 7]) {
    const SWATCH: f64 = 42.0;

    doc.text(x, y - 8.0, 12.0, "start", "bold", label);
    for (i, color) in ramp.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let sx = (i as f64).mul_add(SWATCH, x);
        doc.rect(sx, y, SWATCH, 14.0, color);
        let tick = if i == 0 {
            format!("<{:.0}", BREAKS[0])
        } else {
            format!("{:.0}", BREAKS[i - 1])
        };
        doc.text(sx, y + 28.0, 10.0, "start", "normal", &tick);
    }
}

/// Builds the county `GeoJSON` for one year.
///
/// Each feature carries the record's fields plus `name` and `st_abbrev`
/// from the boundary, with unprojected geometry.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if a record cannot be serialized.
pub fn county_feature_collection(
    counties: &[GeoJoinedRow<'_, CountyResultWithPopulation>],
) -> Result<FeatureCollection, RenderError> {
    let features = counties
        .iter()
        .map(|joined| -> Result<Feature, RenderError> {
            let mut properties = match serde_json::to_value(joined.row)? {
                Value::Object(map) => map,
                _ => JsonObject::new(),
            };
            properties.insert("name".to_string(), Value::from(joined.boundary.name.clone()));
            properties.insert(
                "st_abbrev".to_string(),
                Value::from(joined.boundary.state_abbr.clone()),
            );
            Ok(feature(joined.boundary, properties))
        })
        .collect::<Result<Vec<_>, RenderError>>()?;

    Ok(collection(features))
}

/// Builds the state outline `GeoJSON`.
#[must_use]
pub fn state_feature_collection(states: &BoundaryLayer) -> FeatureCollection {
    let features = states
        .boundaries
        .iter()
        .map(|boundary| {
            let mut properties = JsonObject::new();
            properties.insert("STATE_NAME".to_string(), Value::from(boundary.name.clone()));
            properties.insert("STATE_FIPS".to_string(), Value::from(boundary.id.clone()));
            feature(boundary, properties)
        })
        .collect();

    collection(features)
}

fn feature(boundary: &Boundary, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &boundary.geometry,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Writes a choropleth and a `GeoJSON` sidecar for every year in `rows`,
/// plus the shared state outlines.
///
/// # Errors
///
/// Returns [`RenderError`] if a document cannot be built or written.
pub fn write_choropleths(
    dirs: &OutputDirs,
    rows: &[CountyResultWithPopulation],
    counties: &BoundaryLayer,
    states: &BoundaryLayer,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::new();

    for (year, year_rows) in group_by_year(rows, |r| r.result.year) {
        let joined = counties.join(year_rows, |r| r.result.fips.as_str());
        log::info!("{year}: {} counties joined to boundaries", joined.len());

        let path = image_path(dirs, year);
        write_png(&path, &build_choropleth_svg(year, &joined, states)?)?;
        written.push(path);

        let path = geojson_path(dirs, year);
        write_json(&path, &county_feature_collection(&joined)?)?;
        written.push(path);
    }

    let path = states_geojson_path(dirs);
    write_json(&path, &state_feature_collection(states))?;
    written.push(path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use election_atlas_geography_models::BoundaryLevel;
    use election_atlas_results_models::{CountyResult, Winner};

    use super::*;
    use crate::projection::AlbersEqualArea;
    use crate::test_fixtures::{layers, temp_dirs};

    fn row(fips: &str, year: u16, winner: Winner, pct: f64) -> CountyResultWithPopulation {
        CountyResultWithPopulation {
            result: CountyResult {
                fips: fips.to_string(),
                county_name: "TEST".to_string(),
                state_po: "KS".to_string(),
                year,
                votes_dem: 40,
                votes_rep: 60,
                votes_all: 100,
                dem_pct: 100.0 - pct,
                rep_pct: pct,
                margin: Some(pct - (100.0 - pct)),
                winner,
            },
            population: Some(1_000),
            white_alone: None,
            white_alone_pct: None,
        }
    }

    #[test]
    fn fills_by_winner_share() {
        let (counties, states) = layers();
        let rows = vec![
            row("20001", 2020, Winner::Rep, 72.0),
            row("20003", 2020, Winner::Tie, 50.0),
        ];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        let svg = build_choropleth_svg(2020, &joined, &states).unwrap();

        assert!(svg.contains("Presidential Election Results by County - 2020"));
        assert!(svg.contains(&format!(r#"fill="{}" fill-rule"#, REP_RAMP[5])));
        assert!(svg.contains(r##"fill="none" fill-rule="evenodd" stroke="#ffffff""##));
        assert!(svg.contains("Republican %"));
        assert!(svg.contains("Democratic %"));
    }

    #[test]
    fn empty_state_layer_is_an_error() {
        let (counties, _) = layers();
        let empty = BoundaryLayer::new(BoundaryLevel::State, vec![], &AlbersEqualArea::conus());
        let rows = vec![row("20001", 2020, Winner::Rep, 60.0)];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        assert!(matches!(
            build_choropleth_svg(2020, &joined, &empty),
            Err(RenderError::Conversion { .. })
        ));
    }

    #[test]
    fn sidecar_carries_record_and_boundary_fields() {
        let (counties, states) = layers();
        let rows = vec![row("20003", 2016, Winner::Rep, 66.0)];
        let joined = counties.join(&rows, |r| r.result.fips.as_str());
        let fc = county_feature_collection(&joined).unwrap();

        assert_eq!(fc.features.len(), 1);
        let feature = &fc.features[0];
        assert_eq!(feature.property("fips"), Some(&Value::from("20003")));
        assert_eq!(feature.property("winner"), Some(&Value::from("rep")));
        assert_eq!(feature.property("population"), Some(&Value::from(1_000)));
        assert_eq!(feature.property("name"), Some(&Value::from("County 20003")));
        assert_eq!(feature.property("st_abbrev"), Some(&Value::from("KS")));
        assert!(feature.geometry.is_some());

        let states = state_feature_collection(&states);
        assert_eq!(
            states.features[0].property("STATE_FIPS"),
            Some(&Value::from("20"))
        );
    }

    #[test]
    fn writes_one_map_per_year() {
        let (dir, dirs) = temp_dirs("choropleth");
        let (counties, states) = layers();
        let rows = vec![
            row("20001", 2016, Winner::Rep, 60.0),
            row("20001", 2020, Winner::Dem, 55.0),
        ];

        let written = write_choropleths(&dirs, &rows, &counties, &states).unwrap();
        assert_eq!(written.len(), 5);
        let image = std::fs::read(image_path(&dirs, 2016)).unwrap();
        assert!(image.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert_eq!(&image[16..20], &WIDTH.to_be_bytes());
        assert!(geojson_path(&dirs, 2020).exists());
        assert!(states_geojson_path(&dirs).exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
