//! Coordinate reference system transformations.
//!
//! Projections work in projected metres (degrees for plate carrée) and
//! geographic degrees, following the CF grid-mapping parameter names used
//! by the NetCDF products they describe.

pub mod geostationary;
pub mod lambert;
pub mod mercator;
pub mod plate_carree;

use wx_common::GeoBBox;

pub use geostationary::Geostationary;
pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use plate_carree::PlateCarree;

/// Default spherical earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_370_997.0;

/// Axis-aligned rectangle in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl ProjectedBounds {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    fn include(&mut self, x: f64, y: f64) {
        self.xmin = self.xmin.min(x);
        self.xmax = self.xmax.max(x);
        self.ymin = self.ymin.min(y);
        self.ymax = self.ymax.max(y);
    }
}

/// Forward and inverse transform between geographic and projected space.
pub trait MapProjection {
    fn name(&self) -> &'static str;

    /// `(lon, lat)` degrees to projected `(x, y)`; `None` when the point has
    /// no image (behind the disk, at a pole).
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Projected `(x, y)` to `(lon, lat)` degrees.
    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Projected rectangle enclosing `bbox`, sampled along its edges since
    /// parallels and meridians curve in most projections.
    fn projected_bounds(&self, bbox: &GeoBBox) -> Option<ProjectedBounds> {
        const SAMPLES: usize = 50;
        let mut bounds: Option<ProjectedBounds> = None;

        for t in 0..=SAMPLES {
            let frac = t as f64 / SAMPLES as f64;
            let lon = bbox.west + frac * bbox.width();
            let lat = bbox.south + frac * bbox.height();
            let edges = [
                (lon, bbox.north),
                (lon, bbox.south),
                (bbox.west, lat),
                (bbox.east, lat),
            ];
            for (lon, lat) in edges {
                if let Some((x, y)) = self.project(lon, lat) {
                    match bounds.as_mut() {
                        Some(b) => b.include(x, y),
                        None => {
                            bounds = Some(ProjectedBounds {
                                xmin: x,
                                xmax: x,
                                ymin: y,
                                ymax: y,
                            })
                        }
                    }
                }
            }
        }
        bounds
    }
}

/// Any supported projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Lambert(LambertConformal),
    Geostationary(Geostationary),
    Mercator(Mercator),
    PlateCarree(PlateCarree),
}

impl Projection {
    fn inner(&self) -> &dyn MapProjection {
        match self {
            Projection::Lambert(p) => p,
            Projection::Geostationary(p) => p,
            Projection::Mercator(p) => p,
            Projection::PlateCarree(p) => p,
        }
    }
}

impl MapProjection for Projection {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        self.inner().project(lon, lat)
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.inner().unproject(x, y)
    }
}

impl From<LambertConformal> for Projection {
    fn from(p: LambertConformal) -> Self {
        Projection::Lambert(p)
    }
}

impl From<Geostationary> for Projection {
    fn from(p: Geostationary) -> Self {
        Projection::Geostationary(p)
    }
}

impl From<Mercator> for Projection {
    fn from(p: Mercator) -> Self {
        Projection::Mercator(p)
    }
}

impl From<PlateCarree> for Projection {
    fn from(p: PlateCarree) -> Self {
        Projection::PlateCarree(p)
    }
}

/// Normalize a longitude difference (radians) to [-π, π].
pub(crate) fn wrap_radians(mut dlon: f64) -> f64 {
    use std::f64::consts::PI;
    while dlon > PI {
        dlon -= 2.0 * PI;
    }
    while dlon < -PI {
        dlon += 2.0 * PI;
    }
    dlon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_bounds_of_plate_carree_is_bbox() {
        let bbox = GeoBBox::new(-125.0, -65.0, 23.0, 50.0);
        let b = PlateCarree::default().projected_bounds(&bbox).unwrap();
        assert_eq!((b.xmin, b.xmax, b.ymin, b.ymax), (-125.0, -65.0, 23.0, 50.0));
        assert_eq!(b.width(), 60.0);
    }

    #[test]
    fn test_enum_dispatch() {
        let p: Projection = Mercator::new(0.0, 0.0, EARTH_RADIUS_M).into();
        assert_eq!(p.name(), "mercator");
        let (x, y) = p.project(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }
}
