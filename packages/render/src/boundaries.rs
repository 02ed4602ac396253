//! County and state boundary polygons.
//!
//! Boundaries come from two public `GeoJSON` files. Counties carry their
//! FIPS in `ID`, name in `NAME` and state in `ST_ABBREV`; states carry
//! `STATE_FIPS` and `STATE_NAME`.

use std::collections::HashMap;
use std::str::FromStr as _;

use election_atlas_geography_models::fips::{pad_county_fips, pad_state_fips, state_abbr};
use election_atlas_geography_models::{BoundaryLevel, is_conus};
use geo::{BoundingRect, Centroid, MultiPolygon, Point, Rect};
use geojson::{Feature, GeoJson};

use crate::RenderError;
use crate::projection::AlbersEqualArea;

/// County polygons.
pub const COUNTIES_URL: &str = "https://stilesdata.com/gis/usa_counties_demos_generations.geojson";

/// State polygons.
pub const STATES_URL: &str = "https://stilesdata.com/gis/usa_states_esri_simple.json";

/// Returns the source URL for a boundary level.
#[must_use]
pub const fn boundaries_url(level: BoundaryLevel) -> &'static str {
    match level {
        BoundaryLevel::County => COUNTIES_URL,
        BoundaryLevel::State => STATES_URL,
    }
}

/// One boundary polygon in WGS84 longitude/latitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Five-digit county FIPS or two-digit state FIPS.
    pub id: String,
    /// County or state name.
    pub name: String,
    /// Two-letter state abbreviation.
    pub state_abbr: String,
    /// Polygon geometry.
    pub geometry: MultiPolygon<f64>,
}

/// Downloads and parses the boundaries for a level.
///
/// # Errors
///
/// Returns [`RenderError::Http`] if the download fails and
/// [`RenderError::GeoJson`] if the body is not a feature collection.
pub async fn fetch_boundaries(
    client: &reqwest::Client,
    level: BoundaryLevel,
) -> Result<Vec<Boundary>, RenderError> {
    let url = boundaries_url(level);
    log::info!("Fetching {level:?} boundaries from {url}");

    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let boundaries = parse_boundaries(&body, level)?;

    log::info!("Loaded {} {level:?} boundaries", boundaries.len());
    Ok(boundaries)
}

/// Parses a `GeoJSON` feature collection into boundaries.
///
/// Features without a usable id or polygon geometry are skipped.
///
/// # Errors
///
/// Returns [`RenderError::GeoJson`] if the text is not `GeoJSON`, and
/// [`RenderError::Conversion`] if it is not a feature collection.
pub fn parse_boundaries(geojson: &str, level: BoundaryLevel) -> Result<Vec<Boundary>, RenderError> {
    let GeoJson::FeatureCollection(collection) = GeoJson::from_str(geojson)? else {
        return Err(RenderError::Conversion {
            message: "boundary file is not a FeatureCollection".to_string(),
        });
    };

    let total = collection.features.len();
    let boundaries: Vec<Boundary> = collection
        .features
        .into_iter()
        .filter_map(|feature| feature_to_boundary(feature, level))
        .collect();

    if boundaries.len() < total {
        log::warn!(
            "Skipped {} of {total} {level:?} features without an id or polygon",
            total - boundaries.len()
        );
    }
    Ok(boundaries)
}

fn feature_to_boundary(feature: Feature, level: BoundaryLevel) -> Option<Boundary> {
    let text = |key: &str| -> Option<String> {
        match feature.property(key)? {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let (id, name, abbr) = match level {
        BoundaryLevel::County => {
            let id = pad_county_fips(&text("ID")?)?;
            let abbr = text("ST_ABBREV").unwrap_or_default();
            (id, text("NAME").unwrap_or_default(), abbr)
        }
        BoundaryLevel::State => {
            let id = pad_state_fips(&text("STATE_FIPS")?)?;
            let abbr = state_abbr(&id).to_string();
            (id, text("STATE_NAME").unwrap_or_default(), abbr)
        }
    };

    let geometry = polygonal(feature.geometry?)?;
    Some(Boundary {
        id,
        name,
        state_abbr: abbr,
        geometry,
    })
}

/// Converts polygon geometry to a multipolygon. Other geometry types are
/// rejected.
fn polygonal(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Drops Alaska and Hawaii.
#[must_use]
pub fn conus_only(boundaries: Vec<Boundary>) -> Vec<Boundary> {
    boundaries
        .into_iter()
        .filter(|b| is_conus(&b.state_abbr))
        .collect()
}

/// Boundaries together with their projected geometry.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    /// Level of every boundary in the layer.
    pub level: BoundaryLevel,
    /// Boundaries in source order, unprojected.
    pub boundaries: Vec<Boundary>,
    /// Projected geometry, parallel to `boundaries`.
    pub projected: Vec<MultiPolygon<f64>>,
}

/// A record joined to its boundary.
#[derive(Debug, Clone, Copy)]
pub struct GeoJoinedRow<'a, T> {
    /// The record.
    pub row: &'a T,
    /// Unprojected boundary.
    pub boundary: &'a Boundary,
    /// Projected geometry.
    pub projected: &'a MultiPolygon<f64>,
}

impl<T> GeoJoinedRow<'_, T> {
    /// Centroid of the projected geometry.
    #[must_use]
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.projected.centroid()
    }
}

impl BoundaryLayer {
    /// Projects `boundaries` with `projection`.
    #[must_use]
    pub fn new(
        level: BoundaryLevel,
        boundaries: Vec<Boundary>,
        projection: &AlbersEqualArea,
    ) -> Self {
        let projected = boundaries
            .iter()
            .map(|b| projection.project_multi_polygon(&b.geometry))
            .collect();
        Self {
            level,
            boundaries,
            projected,
        }
    }

    /// Boundaries paired with their projected geometry.
    pub fn iter(&self) -> impl Iterator<Item = (&Boundary, &MultiPolygon<f64>)> {
        self.boundaries.iter().zip(&self.projected)
    }

    /// Projected geometry in boundary order.
    pub fn geometries(&self) -> impl Iterator<Item = &MultiPolygon<f64>> {
        self.projected.iter()
    }

    /// Bounding box of the projected layer.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.projected
            .iter()
            .filter_map(|g| g.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }

    /// Inner-joins `rows` to the layer on boundary id.
    ///
    /// Output follows boundary order. When several rows share an id the
    /// last one wins.
    pub fn join<'a, T, I, F>(&'a self, rows: I, key: F) -> Vec<GeoJoinedRow<'a, T>>
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&'a T) -> &'a str,
    {
        let by_id: HashMap<&str, &T> = rows.into_iter().map(|r| (key(r), r)).collect();

        self.iter()
            .filter_map(|(boundary, projected)| {
                by_id.get(boundary.id.as_str()).map(|&row| GeoJoinedRow {
                    row,
                    boundary,
                    projected,
                })
            })
            .collect()
    }
}
