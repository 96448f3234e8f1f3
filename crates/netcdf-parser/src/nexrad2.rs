//! NEXRAD Level II volumes in the CDM radial convention.
//!
//! Each moment is stored per sweep as `(sweep, radial, gate)` with companion
//! `time`, `azimuth`, `elevation` and `distance` variables named by a one-letter
//! moment suffix. Super-resolution variants append `_HI` to every name, so
//! `Reflectivity_HI` pairs with `timeR_HI`, `azimuthR_HI` and `distanceR_HI`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use wx_common::units::{self, KNOT, METER_PER_SECOND};
use wx_common::{GeoBBox, Unit, WxError, WxResult};

use crate::cf_time::CfTimeUnits;
use crate::handle::{attr_f64, attr_str, is_unsigned, DatasetHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadarType {
    Reflectivity,
    RadialVelocity,
    SpectrumWidth,
    DifferentialReflectivity,
    CorrelationCoefficient,
    DifferentialPhase,
}

impl RadarType {
    pub const ALL: [RadarType; 6] = [
        RadarType::Reflectivity,
        RadarType::RadialVelocity,
        RadarType::SpectrumWidth,
        RadarType::DifferentialReflectivity,
        RadarType::CorrelationCoefficient,
        RadarType::DifferentialPhase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RadarType::Reflectivity => "Reflectivity",
            RadarType::RadialVelocity => "RadialVelocity",
            RadarType::SpectrumWidth => "SpectrumWidth",
            RadarType::DifferentialReflectivity => "DifferentialReflectivity",
            RadarType::CorrelationCoefficient => "CorrelationCoefficient",
            RadarType::DifferentialPhase => "DifferentialPhase",
        }
    }

    /// Suffix of the companion variables: the first letter of the moment,
    /// except radial velocity which would clash with reflectivity.
    pub fn suffix(&self) -> char {
        match self {
            RadarType::RadialVelocity => 'V',
            other => other.name().chars().next().unwrap_or('R'),
        }
    }

    pub fn data_var(&self, hires: bool) -> String {
        with_resolution(self.name().to_string(), hires)
    }

    /// Companion variable such as `timeR` or `azimuthV_HI`.
    pub fn companion_var(&self, prefix: &str, hires: bool) -> String {
        with_resolution(format!("{}{}", prefix, self.suffix()), hires)
    }
}

fn with_resolution(mut name: String, hires: bool) -> String {
    if hires {
        name.push_str("_HI");
    }
    name
}

impl fmt::Display for RadarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RadarType {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RadarType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| WxError::invalid(format!("Invalid radar type {}", s)))
    }
}

/// Radar-relative `(x, y)` of a gate: azimuth is measured clockwise from
/// north, so sine goes with x and cosine with y.
pub fn polar_to_xy(azimuth_deg: f64, range: f64) -> (f64, f64) {
    let az = azimuth_deg.to_radians();
    (range * az.sin(), range * az.cos())
}

/// An open Level II volume.
pub struct Level2Volume {
    handle: DatasetHandle,
    station: String,
    station_location: (f64, f64),
    extent: GeoBBox,
}

impl Level2Volume {
    pub fn open(source: &str) -> WxResult<Self> {
        let handle = DatasetHandle::open(source)?;
        let station = handle.global_str("Station")?;
        let station_location = (
            handle.global_f64("StationLatitude")?,
            handle.global_f64("StationLongitude")?,
        );
        let extent = GeoBBox::new(
            handle.global_f64("geospatial_lon_min")?,
            handle.global_f64("geospatial_lon_max")?,
            handle.global_f64("geospatial_lat_min")?,
            handle.global_f64("geospatial_lat_max")?,
        );
        debug!(station = %station, "Opened Level II volume");
        Ok(Self {
            handle,
            station,
            station_location,
            extent,
        })
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// `(latitude, longitude)` of the radar site.
    pub fn station_location(&self) -> (f64, f64) {
        self.station_location
    }

    pub fn extent(&self) -> GeoBBox {
        self.extent
    }

    pub fn sweep_count(&self, radar_type: RadarType, hires: bool) -> WxResult<usize> {
        let var = self.handle.variable(&radar_type.data_var(hires))?;
        Ok(var.dimensions().first().map(|d| d.len()).unwrap_or(0))
    }

    /// Decode one sweep of a moment.
    pub fn sweep(&self, radar_type: RadarType, hires: bool, sweep: usize) -> WxResult<RadarSweep> {
        let sweeps = self.sweep_count(radar_type, hires)?;
        if sweep >= sweeps {
            return Err(WxError::invalid(format!(
                "Sweep {} out of range, {} has {} sweeps",
                sweep, radar_type, sweeps
            )));
        }

        let timestamp = {
            let var = self.handle.variable(&radar_type.companion_var("time", hires))?;
            let raw: Vec<f64> = var
                .get_values((sweep, ..))
                .map_err(|e| WxError::NetCdf(format!("Failed to read sweep times: {}", e)))?;
            let units = attr_str(&var, "units").map(|u| u.replace("msecs", "milliseconds"));
            sweep_start(&raw, &CfTimeUnits::parse_or_epoch(units.as_deref()))?
        };

        let azimuths: Vec<f64> = self
            .handle
            .variable(&radar_type.companion_var("azimuth", hires))?
            .get_values((sweep, ..))
            .map_err(|e| WxError::NetCdf(format!("Failed to read azimuths: {}", e)))?;
        let ranges: Vec<f64> = self
            .handle
            .variable(&radar_type.companion_var("distance", hires))?
            .get_values(..)
            .map_err(|e| WxError::NetCdf(format!("Failed to read gate distances: {}", e)))?;

        let var = self.handle.variable(&radar_type.data_var(hires))?;
        let packing = GatePacking {
            scale_factor: attr_f64(&var, "scale_factor").unwrap_or(1.0),
            add_offset: attr_f64(&var, "add_offset").unwrap_or(0.0),
            fill_value: attr_f64(&var, "_FillValue").or_else(|| attr_f64(&var, "missing_value")),
        };
        let gates = if is_unsigned(&var) {
            let raw: Vec<i8> = var
                .get_values((sweep, .., ..))
                .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", radar_type, e)))?;
            packing.unpack_unsigned(&raw)
        } else {
            let raw: Vec<f32> = var
                .get_values((sweep, .., ..))
                .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", radar_type, e)))?;
            packing.unpack_signed(&raw)
        };
        let data_units = attr_str(&var, "units").and_then(|u| units::get(&u).ok());

        let mut decoded = RadarSweep {
            station: self.station.clone(),
            station_location: self.station_location,
            radar_type,
            hires,
            sweep,
            timestamp,
            azimuths,
            ranges,
            gates,
            units: data_units,
        };
        if decoded.gates.len() < decoded.azimuths.len() * decoded.ranges.len() {
            return Err(WxError::NetCdf(format!(
                "{} sweep {} has {} gates for {} radials of {} bins",
                radar_type,
                sweep,
                decoded.gates.len(),
                decoded.azimuths.len(),
                decoded.ranges.len()
            )));
        }
        if radar_type == RadarType::RadialVelocity && decoded.units == Some(METER_PER_SECOND) {
            decoded.convert_units(&KNOT)?;
        }

        info!(
            station = %self.station,
            radar_type = %radar_type,
            sweep = sweep,
            timestamp = %timestamp,
            "Finished parsing radar sweep"
        );
        Ok(decoded)
    }
}

/// Sweep start time: the earliest radial time.
fn sweep_start(raw: &[f64], units: &CfTimeUnits) -> WxResult<DateTime<Utc>> {
    let earliest = raw
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !earliest.is_finite() {
        return Err(WxError::NetCdf("Sweep has no valid radial times".into()));
    }
    units.to_datetime(earliest)
}

struct GatePacking {
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
}

impl GatePacking {
    /// Byte gates are unsigned counts; count 0 means no echo.
    fn unpack_unsigned(&self, raw: &[i8]) -> Vec<f32> {
        raw.iter()
            .map(|&r| match r as u8 {
                0 => f32::NAN,
                count => (count as f64 * self.scale_factor + self.add_offset) as f32,
            })
            .collect()
    }

    /// Signed gates: fill is masked, the rest scaled; a scaled value of
    /// exactly 0 is also treated as no echo.
    fn unpack_signed(&self, raw: &[f32]) -> Vec<f32> {
        raw.iter()
            .map(|&r| {
                if r.is_nan() || self.fill_value.map_or(false, |fill| r as f64 == fill) {
                    return f32::NAN;
                }
                let value = (r as f64 * self.scale_factor + self.add_offset) as f32;
                if value == 0.0 {
                    f32::NAN
                } else {
                    value
                }
            })
            .collect()
    }
}

/// One decoded sweep. `gates` is row-major, one row of `ranges.len()` bins
/// per radial, `NaN` where masked.
#[derive(Debug, Clone)]
pub struct RadarSweep {
    pub station: String,
    pub station_location: (f64, f64),
    pub radar_type: RadarType,
    pub hires: bool,
    pub sweep: usize,
    pub timestamp: DateTime<Utc>,
    /// Degrees clockwise from north, one per radial.
    pub azimuths: Vec<f64>,
    /// Gate distances in meters.
    pub ranges: Vec<f64>,
    pub gates: Vec<f32>,
    pub units: Option<Unit>,
}

impl RadarSweep {
    pub fn radials(&self) -> usize {
        self.azimuths.len()
    }

    pub fn bins(&self) -> usize {
        self.ranges.len()
    }

    pub fn gate(&self, radial: usize, bin: usize) -> Option<f32> {
        if radial >= self.radials() || bin >= self.bins() {
            return None;
        }
        self.gates.get(radial * self.bins() + bin).copied()
    }

    pub fn gate_xy(&self, radial: usize, bin: usize) -> Option<(f64, f64)> {
        Some(polar_to_xy(*self.azimuths.get(radial)?, *self.ranges.get(bin)?))
    }

    /// Convert gate values in place; masked gates stay masked.
    pub fn convert_units(&mut self, to: &Unit) -> WxResult<()> {
        let from = self
            .units
            .ok_or_else(|| WxError::Units(format!("{} sweep has no units", self.radar_type)))?;
        for value in self.gates.iter_mut().filter(|v| !v.is_nan()) {
            *value = from.convert(*value as f64, to)? as f32;
        }
        self.units = Some(*to);
        Ok(())
    }
}
