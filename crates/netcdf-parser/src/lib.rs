//! NetCDF/OPeNDAP decoding of weather products.
//!
//! Three product families are supported:
//!
//! - legacy GOES GINI imagery ([`gini`]), one 8-bit frame on a Lambert
//!   conformal grid;
//! - GOES-16 Sectorized Cloud and Moisture Imagery ([`goes16`]), on Lambert,
//!   fixed-grid or Mercator mappings;
//! - NEXRAD Level II volumes exposed through the CDM radial convention
//!   ([`nexrad2`]).
//!
//! Reading uses the `netcdf` crate (libnetcdf with DAP support) through a
//! scoped [`DatasetHandle`]. Decoded products carry their native projection
//! so the renderer can place them on any map.
//!
//! # System requirements
//!
//! libnetcdf and libhdf5 (`libnetcdf-dev libhdf5-dev`).

pub mod cf_time;
pub mod gini;
pub mod goes16;
pub mod handle;
pub mod nexrad2;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use projection::Projection;
use wx_common::{Unit, WxError, WxResult};

pub use cf_time::{CfTimeUnits, TimeStep};
pub use gini::{load_gini, pixel_to_temp};
pub use goes16::{load_scmi, Goes16Scan};
pub use handle::{silence_hdf5_errors, DatasetHandle};
pub use nexrad2::{polar_to_xy, Level2Volume, RadarSweep, RadarType};

/// Spectral class of a satellite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatType {
    Vis,
    NearIr,
    Ir,
    Wv,
}

impl SatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SatType::Vis => "VIS",
            SatType::NearIr => "NEAR_IR",
            SatType::Ir => "IR",
            SatType::Wv => "WV",
        }
    }
}

impl fmt::Display for SatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SatType {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VIS" => Ok(SatType::Vis),
            "NEAR_IR" => Ok(SatType::NearIr),
            "IR" => Ok(SatType::Ir),
            // GINI water vapour files are tagged with the combined keyword
            "WV" | "IR_WV" => Ok(SatType::Wv),
            other => Err(WxError::invalid(format!("Invalid satellite type: {}", other))),
        }
    }
}

/// Latitude/longitude in degrees with an optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3d {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// A decoded satellite frame on its native projected grid.
///
/// `x` and `y` are projection coordinates in meters; `data` is row-major
/// (`y.len()` rows of `x.len()` values), with `NaN` for missing pixels.
#[derive(Debug, Clone)]
pub struct SatelliteGrid {
    pub sattype: SatType,
    pub timestamp: DateTime<Utc>,
    pub projection: Projection,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub data: Vec<f32>,
    /// Units of `data`; `None` for raw brightness counts.
    pub units: Option<Unit>,
}

impl SatelliteGrid {
    pub fn width(&self) -> usize {
        self.x.len()
    }

    pub fn height(&self) -> usize {
        self.y.len()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.data.get(row * self.width() + col).copied()
    }

    /// `(xmin, xmax, ymin, ymax)` of the grid coordinates.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let (xmin, xmax) = min_max(&self.x);
        let (ymin, ymax) = min_max(&self.y);
        (xmin, xmax, ymin, ymax)
    }

    pub(crate) fn check_shape(&self) -> WxResult<()> {
        let expected = self.width() * self.height();
        if self.data.len() < expected {
            return Err(WxError::NetCdf(format!(
                "Pixel data has {} values, grid needs {}",
                self.data.len(),
                expected
            )));
        }
        Ok(())
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::PlateCarree;

    #[test]
    fn test_sattype_parse() {
        assert_eq!("ir_wv".parse::<SatType>().unwrap(), SatType::Wv);
        assert_eq!("NEAR_IR".parse::<SatType>().unwrap(), SatType::NearIr);
        assert!("UV".parse::<SatType>().is_err());
        assert_eq!(SatType::NearIr.to_string(), "NEAR_IR");
    }

    #[test]
    fn test_grid_lookup_and_extent() {
        let grid = SatelliteGrid {
            sattype: SatType::Vis,
            timestamp: Utc::now(),
            projection: PlateCarree::default().into(),
            x: vec![-1.0, 0.0, 1.0],
            y: vec![2.0, -2.0],
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            units: None,
        };
        assert_eq!(grid.value(1, 2), Some(6.0));
        assert_eq!(grid.value(2, 0), None);
        assert_eq!(grid.extent(), (-1.0, 1.0, -2.0, 2.0));
        assert!(grid.check_shape().is_ok());
    }
}
