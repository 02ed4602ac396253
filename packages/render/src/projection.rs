//! Albers Equal Area conic projection on a sphere.

use geo::{Coord, MapCoords, MultiPolygon};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_007.0;

/// Spherical Albers Equal Area projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlbersEqualArea {
    lon0: f64,
    n: f64,
    c: f64,
    rho0: f64,
    radius: f64,
}

impl AlbersEqualArea {
    /// Builds a projection. Angles are in degrees.
    #[must_use]
    pub fn new(central_meridian: f64, origin_lat: f64, parallel_1: f64, parallel_2: f64) -> Self {
        let phi0 = origin_lat.to_radians();
        let phi1 = parallel_1.to_radians();
        let phi2 = parallel_2.to_radians();

        let n = f64::midpoint(phi1.sin(), phi2.sin());
        let c = 2.0f64.mul_add(n * phi1.sin(), phi1.cos().powi(2));
        let rho0 = EARTH_RADIUS_M * (2.0 * n).mul_add(-phi0.sin(), c).sqrt() / n;

        Self {
            lon0: central_meridian.to_radians(),
            n,
            c,
            rho0,
            radius: EARTH_RADIUS_M,
        }
    }

    /// The contiguous United States: central meridian −96°, origin 37.5°N,
    /// standard parallels 29.5°N and 45.5°N.
    #[must_use]
    pub fn conus() -> Self {
        Self::new(-96.0, 37.5, 29.5, 45.5)
    }

    /// Projects a longitude/latitude pair (degrees) to meters.
    #[must_use]
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let theta = self.n * (lon.to_radians() - self.lon0);
        let rho = self.radius * (2.0 * self.n).mul_add(-phi.sin(), self.c).max(0.0).sqrt() / self.n;

        (rho * theta.sin(), rho.mul_add(-theta.cos(), self.rho0))
    }

    /// Projects a single coordinate.
    #[must_use]
    pub fn project_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.project(coord.x, coord.y);
        Coord { x, y }
    }

    /// Projects every vertex of a multipolygon.
    #[must_use]
    pub fn project_multi_polygon(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        geometry.map_coords(|c| self.project_coord(c))
    }
}
