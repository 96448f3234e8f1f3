//! Equirectangular projection in degrees.

use crate::MapProjection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateCarree {
    /// Central longitude (degrees)
    pub central_longitude: f64,
}

impl PlateCarree {
    pub fn new(central_longitude: f64) -> Self {
        Self { central_longitude }
    }
}

fn wrap_degrees(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

impl MapProjection for PlateCarree {
    fn name(&self) -> &'static str {
        "plate_carree"
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if lat.abs() > 90.0 {
            return None;
        }
        Some((wrap_degrees(lon - self.central_longitude), lat))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((wrap_degrees(x + self.central_longitude), y))
    }
}
