//! Lambert Conformal Conic projection.
//!
//! Used by the GOES legacy GINI and GOES-16 CONUS products. Parameters follow
//! the CF `lambert_conformal_conic` grid mapping:
//! - `latitude_of_projection_origin` (lat0)
//! - `longitude_of_central_meridian` (lon0)
//! - `standard_parallel`: one value (tangent cone) or two (secant cone)
//! - `false_easting` / `false_northing` in metres

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use wx_common::{WxError, WxResult};

use crate::{wrap_radians, MapProjection};

#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Sphere radius (metres)
    pub earth_radius: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Cone constant
    n: f64,
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Build from CF attributes, angles in degrees.
    ///
    /// A cone constant of zero (standard parallel on the equator) has no
    /// conic solution and is rejected.
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        standard_parallels: &[f64],
        earth_radius: f64,
    ) -> WxResult<Self> {
        let (latin1_deg, latin2_deg) = match standard_parallels {
            [one] => (*one, *one),
            [one, two] => (*one, *two),
            other => {
                return Err(WxError::invalid(format!(
                    "Lambert conformal needs one or two standard parallels, got {}",
                    other.len()
                )))
            }
        };
        if earth_radius.is_nan() || earth_radius <= 0.0 {
            return Err(WxError::invalid(format!("Invalid earth radius: {}", earth_radius)));
        }

        let lat0 = lat0_deg.to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        let n = if (latin1 - latin2).abs() < 1e-10 {
            latin1.sin()
        } else {
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio = ((FRAC_PI_4 + latin2 / 2.0).tan() / (FRAC_PI_4 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };
        if n.abs() < 1e-10 || !n.is_finite() {
            return Err(WxError::invalid("Lambert conformal standard parallel cannot be the equator"));
        }

        let f = latin1.cos() * (FRAC_PI_4 + latin1 / 2.0).tan().powf(n) / n;
        let rho0 = earth_radius * f / (FRAC_PI_4 + lat0 / 2.0).tan().powf(n);

        Ok(Self {
            lon0: lon0_deg.to_radians(),
            lat0,
            latin1,
            latin2,
            earth_radius,
            false_easting: 0.0,
            false_northing: 0.0,
            n,
            f,
            rho0,
        })
    }

    pub fn with_false_origin(mut self, easting: f64, northing: f64) -> Self {
        self.false_easting = easting;
        self.false_northing = northing;
        self
    }

    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    fn rho(&self, lat: f64) -> f64 {
        self.earth_radius * self.f / (FRAC_PI_4 + lat / 2.0).tan().powf(self.n)
    }
}

impl MapProjection for LambertConformal {
    fn name(&self) -> &'static str {
        "lambert_conformal_conic"
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lat = lat.to_radians();
        // The pole opposite the cone apex maps to infinity.
        if (lat + self.n.signum() * FRAC_PI_2).abs() < 1e-10 {
            return None;
        }
        let theta = self.n * wrap_radians(lon.to_radians() - self.lon0);
        let rho = self.rho(lat);

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let sign = self.n.signum();

        let rho = sign * dx.hypot(dy);
        let theta = (sign * dx).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * FRAC_PI_2
        } else {
            2.0 * (self.earth_radius * self.f / rho).powf(1.0 / self.n).atan() - FRAC_PI_2
        };
        let lon = self.lon0 + theta / self.n;

        let lon = wrap_radians(lon).to_degrees();
        let lat = lat.to_degrees();
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    /// GINI CONUS grid mapping.
    fn gini() -> LambertConformal {
        LambertConformal::new(25.0, -95.0, &[25.0], 6_371_200.0).unwrap()
    }

    #[test]
    fn test_origin_maps_to_false_origin() {
        let proj = gini().with_false_origin(1000.0, -500.0);
        let (x, y) = proj.project(-95.0, 25.0).unwrap();
        assert_coords_approx_eq!((x, y), (1000.0, -500.0), 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        let proj = gini();
        for (lon, lat) in [(-122.4, 37.8), (-80.2, 25.8), (-70.0, 45.0), (-95.0, 49.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert_coords_approx_eq!((lon2, lat2), (lon, lat), 1e-8);
        }
    }

    #[test]
    fn test_east_is_positive_x() {
        let proj = gini();
        let (x_west, _) = proj.project(-110.0, 35.0).unwrap();
        let (x_east, _) = proj.project(-80.0, 35.0).unwrap();
        assert!(x_west < 0.0 && x_east > 0.0);
    }

    #[test]
    fn test_secant_cone_constant() {
        // Two standard parallels straddling the tangent case
        let secant = LambertConformal::new(38.5, -97.5, &[33.0, 45.0], 6_371_229.0).unwrap();
        let tangent = LambertConformal::new(38.5, -97.5, &[38.5], 6_371_229.0).unwrap();
        assert_approx_eq!(secant.cone_constant(), 0.6304, 1e-3);
        assert!((secant.cone_constant() - tangent.cone_constant()).abs() < 0.01);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LambertConformal::new(25.0, -95.0, &[], 6_371_200.0).is_err());
        assert!(LambertConformal::new(25.0, -95.0, &[0.0], 6_371_200.0).is_err());
        assert!(LambertConformal::new(25.0, -95.0, &[25.0], -1.0).is_err());
    }
}
