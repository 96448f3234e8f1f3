//! Geostationary fixed-grid projection.
//!
//! GOES-R imagery is gridded in scan angles (radians) seen from a satellite
//! parked over the equator. Projected coordinates here are scan angles
//! multiplied by the perspective point height, so they are metres like the
//! other projections. Formulas follow the GOES-R PUG volume 4, section 4.2.8.

use wx_common::{WxError, WxResult};

use crate::MapProjection;

/// GRS80 ellipsoid used by GOES-R products.
pub const GRS80_SEMI_MAJOR: f64 = 6_378_137.0;
pub const GRS80_SEMI_MINOR: f64 = 6_356_752.31414;
pub const GOES_PERSPECTIVE_HEIGHT: f64 = 35_786_023.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Geostationary {
    /// Satellite height above the surface (metres)
    pub perspective_point_height: f64,
    /// Equatorial radius (metres)
    pub req: f64,
    /// Polar radius (metres)
    pub rpol: f64,
    /// Sub-satellite longitude (radians)
    pub lambda_0: f64,
    /// Distance from earth centre to satellite
    h: f64,
}

impl Geostationary {
    /// Build from CF `geostationary` attributes. Only the GOES `x` sweep
    /// axis is supported.
    pub fn new(
        perspective_point_height: f64,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        longitude_origin_deg: f64,
        sweep_angle_axis: &str,
    ) -> WxResult<Self> {
        if sweep_angle_axis != "x" {
            return Err(WxError::invalid(format!(
                "Unsupported sweep angle axis: {}",
                sweep_angle_axis
            )));
        }
        if perspective_point_height <= 0.0 || semi_major_axis <= 0.0 || semi_minor_axis <= 0.0 {
            return Err(WxError::invalid("Geostationary axes and height must be positive"));
        }
        Ok(Self {
            perspective_point_height,
            req: semi_major_axis,
            rpol: semi_minor_axis,
            lambda_0: longitude_origin_deg.to_radians(),
            h: perspective_point_height + semi_major_axis,
        })
    }

    /// GOES-East at 75°W.
    pub fn goes_east() -> Self {
        Self {
            perspective_point_height: GOES_PERSPECTIVE_HEIGHT,
            req: GRS80_SEMI_MAJOR,
            rpol: GRS80_SEMI_MINOR,
            lambda_0: (-75.0f64).to_radians(),
            h: GOES_PERSPECTIVE_HEIGHT + GRS80_SEMI_MAJOR,
        }
    }

    /// Scan angles (radians) to `(lon, lat)` degrees; `None` when the view
    /// misses the earth.
    pub fn scan_to_geo(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let (sin_x, cos_x) = x_rad.sin_cos();
        let (sin_y, cos_y) = y_rad.sin_cos();
        let axis_ratio = (self.req / self.rpol).powi(2);

        let a = sin_x.powi(2) + cos_x.powi(2) * (cos_y.powi(2) + axis_ratio * sin_y.powi(2));
        let b = -2.0 * self.h * cos_x * cos_y;
        let c = self.h.powi(2) - self.req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        let sx = rs * cos_x * cos_y;
        let sy = -rs * sin_x;
        let sz = rs * cos_x * sin_y;

        let lat = (axis_ratio * sz / (self.h - sx).hypot(sy)).atan();
        let lon = self.lambda_0 - sy.atan2(self.h - sx);
        Some((lon.to_degrees(), lat.to_degrees()))
    }

    /// `(lon, lat)` degrees to scan angles (radians); `None` beyond the limb.
    pub fn geo_to_scan(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lambda_0;

        let horizon = (self.req / self.h).acos();
        if (lat.cos() * dlon.cos()).acos() > horizon {
            return None;
        }

        let phi_c = ((self.rpol / self.req).powi(2) * lat.tan()).atan();
        let e2 = 1.0 - (self.rpol / self.req).powi(2);
        let rc = self.rpol / (1.0 - e2 * phi_c.cos().powi(2)).sqrt();

        let sx = self.h - rc * phi_c.cos() * dlon.cos();
        let sy = -rc * phi_c.cos() * dlon.sin();
        let sz = rc * phi_c.sin();
        if sx <= 0.0 {
            return None;
        }

        let y_rad = sz.atan2(sx.hypot(sy));
        let x_rad = (-sy).atan2(sx);
        Some((x_rad, y_rad))
    }
}

impl MapProjection for Geostationary {
    fn name(&self) -> &'static str {
        "geostationary"
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.geo_to_scan(lon, lat)?;
        Some((x * self.perspective_point_height, y * self.perspective_point_height))
    }

    fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.scan_to_geo(x / self.perspective_point_height, y / self.perspective_point_height)
    }
}
