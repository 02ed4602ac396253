#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static maps and charts of election results.
//!
//! Boundaries are fetched as `GeoJSON`, converted to [`geo`] types, and
//! projected once into a CONUS Albers Equal Area plane. Each renderer joins
//! its records to the projected boundaries and builds an SVG document, which
//! is rasterized to PNG with `resvg`. Choropleths additionally write their
//! joined data as `GeoJSON`.

pub mod boundaries;
pub mod choropleth;
pub mod classify;
pub mod projection;
pub mod scatter;
pub mod shift;
pub mod svg;
pub mod symbols;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use geo::Rect;
use serde::Serialize;

use crate::boundaries::BoundaryLayer;

/// Errors that can occur while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// HTTP request for boundary data failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Boundary data was not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// I/O error (file write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generated SVG document could not be parsed for rasterizing.
    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),

    /// PNG encoding failed.
    #[error("PNG error: {0}")]
    Png(#[from] png::EncodingError),

    /// Input could not be turned into a drawable form.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Directories that renderers write into.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    /// PNG images.
    pub visuals: PathBuf,
    /// `GeoJSON` sidecars.
    pub geo: PathBuf,
}

impl OutputDirs {
    /// Creates both directories if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if a directory cannot be created.
    pub fn ensure(&self) -> Result<(), RenderError> {
        std::fs::create_dir_all(&self.visuals)?;
        std::fs::create_dir_all(&self.geo)?;
        Ok(())
    }
}

/// Groups rows by election year, preserving input order within a year.
pub(crate) fn group_by_year<T>(rows: &[T], year: impl Fn(&T) -> u16) -> BTreeMap<u16, Vec<&T>> {
    let mut groups: BTreeMap<u16, Vec<&T>> = BTreeMap::new();
    for row in rows {
        groups.entry(year(row)).or_default().push(row);
    }
    groups
}

/// Projected bounds of a layer, failing when the layer is empty.
pub(crate) fn layer_bounds(layer: &BoundaryLayer) -> Result<Rect<f64>, RenderError> {
    layer.bounds().ok_or_else(|| RenderError::Conversion {
        message: format!("no {:?} boundaries to frame the map", layer.level),
    })
}

/// Writes `contents` through a `.tmp` sibling, creating the parent
/// directory. Every renderer output goes through here.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Writes compact JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RenderError> {
    write_atomic(path, serde_json::to_string(value)?.as_bytes())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_rows_by_year_in_order() {
        let rows = vec![(2020_u16, "a"), (2016, "b"), (2020, "c")];
        let groups = group_by_year(&rows, |r| r.0);
        let years: Vec<u16> = groups.keys().copied().collect();
        assert_eq!(years, vec![2016, 2020]);
        assert_eq!(groups[&2020].iter().map(|r| r.1).collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn write_json_replaces_file() {
        let (root, dirs) = test_fixtures::temp_dirs("write_json");
        let path = dirs.geo.join("x.geojson");
        write_json(&path, &serde_json::json!({"a": 1})).unwrap();
        write_json(&path, &serde_json::json!({"a": 2})).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"a":2}"#);
        assert!(!path.with_extension("tmp").exists());
        std::fs::remove_dir_all(root).unwrap();
    }
}
