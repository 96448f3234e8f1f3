//! Spherical Mercator, as used by GOES-16 Puerto Rico and mesoscale sectors.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::{wrap_radians, MapProjection};

/// Latitudes beyond this many degrees have no useful Mercator image.
const MAX_LATITUDE: f64 = 89.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    /// Central meridian (radians)
    pub lon0: f64,
    /// Latitude of true scale (radians)
    pub standard_parallel: f64,
    pub earth_radius: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl Mercator {
    pub fn new(lon0_deg: f64, standard_parallel_deg: f64, earth_radius: f64) -> Self {
        Self {
            lon0: lon0_deg.to_radians(),
            standard_parallel: standard_parallel_deg.to_radians(),
            earth_radius,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    pub fn with_false_origin(mut self, easting: f64, northing: f64) -> Self {
        self.false_easting = easting;
        self.false_northing = northing;
        self
    }

    /// Radius scaled to the standard parallel.
    fn scaled_radius(&self) -> f64 {
        self.earth_radius * self.standard_parallel.cos()
    }
}

impl MapProjection for Mercator {
    fn name(&self) -> &'static str {
        "mercator"
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if lat.abs() > MAX_LATITUDE {
            return None;
        }
        let r = self.scaled_radius();
        let x = r * wrap_radians(lon.to_radians() - self.lon0) + self.false_easting;
        let y = r * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() + self.false_northing;
        Some((x, y))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let r = self.scaled_radius();
        let lon = wrap_radians((x - self.false_easting) / r + self.lon0);
        let lat = FRAC_PI_2 - 2.0 * (-(y - self.false_northing) / r).exp().atan();
        Some((lon.to_degrees(), lat.to_degrees()))
    }
}
