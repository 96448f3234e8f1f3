//! GOES-16 Sectorized Cloud and Moisture Imagery (SCMI) tiles.
//!
//! [`load_scmi`] reads only metadata; pixel data is pulled on demand by
//! [`Goes16Scan::read_grid`], which reopens the dataset for the duration of
//! the read.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use projection::{Geostationary, LambertConformal, Mercator, Projection};
use tracing::{debug, info};
use wx_common::{units, WxError, WxResult};

use crate::handle::{attr_f64, attr_f64s, attr_str, is_unsigned, DatasetHandle};
use crate::{Position3d, SatType, SatelliteGrid};

const DATA_VAR: &str = "Sectorized_CMI";

/// Channel to spectral class: 1-2 visible, 3-6 near IR, 8-10 water vapour,
/// 7 and 11-16 infrared.
pub fn sattype_for_channel(channel: u8) -> WxResult<SatType> {
    match channel {
        1 | 2 => Ok(SatType::Vis),
        3..=6 => Ok(SatType::NearIr),
        8..=10 => Ok(SatType::Wv),
        7 | 11..=16 => Ok(SatType::Ir),
        other => Err(WxError::invalid(format!("Invalid satellite channel: {}", other))),
    }
}

/// Metadata of one SCMI tile.
#[derive(Debug, Clone)]
pub struct Goes16Scan {
    pub source: String,
    pub channel: u8,
    pub timestamp: DateTime<Utc>,
    pub satellite_position: Position3d,
    pub product_center: Position3d,
    pub meso_sector: bool,
    pub projection: Projection,
}

pub fn load_scmi(source: &str) -> WxResult<Goes16Scan> {
    let handle = DatasetHandle::open(source)?;

    let channel = handle.global_f64("channel_id")?;
    if !(1.0..=16.0).contains(&channel) {
        return Err(WxError::NetCdf(format!("Invalid channel_id {}", channel)));
    }
    let timestamp = parse_start_date_time(&handle.global_str("start_date_time")?)?;

    let satellite_position = Position3d {
        latitude: handle.global_f64("satellite_latitude")?,
        longitude: handle.global_f64("satellite_longitude")?,
        altitude: Some(handle.global_f64("satellite_altitude")?),
    };
    let product_center = Position3d {
        latitude: handle.global_f64("product_center_latitude")?,
        longitude: handle.global_f64("product_center_longitude")?,
        altitude: None,
    };
    let meso_sector = handle.global_str("product_name")?.contains("MESO");

    let mapping = {
        let scmi = handle.variable(DATA_VAR)?;
        attr_str(&scmi, "grid_mapping")
            .ok_or_else(|| WxError::NetCdf(format!("{} has no grid_mapping", DATA_VAR)))?
    };
    let projection = {
        let geog = handle.variable(&mapping)?;
        projection_from_mapping(&mapping, |name| {
            Some(attr_f64s(&geog, name)).filter(|v| !v.is_empty())
        })?
    };

    info!(source = %source, channel = channel, timestamp = %timestamp, mapping = %mapping, "Finished reading GOES-16 metadata");

    Ok(Goes16Scan {
        source: source.to_string(),
        channel: channel as u8,
        timestamp,
        satellite_position,
        product_center,
        meso_sector,
        projection,
    })
}

impl Goes16Scan {
    pub fn sattype(&self) -> WxResult<SatType> {
        sattype_for_channel(self.channel)
    }

    /// Read and unpack the pixel data.
    ///
    /// With `fix_clipped`, visible-channel fill pixels (clipped highlights)
    /// become full reflectance instead of missing.
    pub fn read_grid(&self, fix_clipped: bool) -> WxResult<SatelliteGrid> {
        let sattype = self.sattype()?;
        let handle = DatasetHandle::open(&self.source)?;
        let altitude = self.satellite_position.altitude.unwrap_or(0.0);

        let x = read_axis(&handle, "x", altitude)?;
        let y = read_axis(&handle, "y", altitude)?;

        let scmi = handle.variable(DATA_VAR)?;
        let raw: Vec<i16> = scmi
            .get_values(..)
            .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", DATA_VAR, e)))?;
        let packing = Packing {
            unsigned: is_unsigned(&scmi),
            scale_factor: attr_f64(&scmi, "scale_factor").unwrap_or(1.0),
            add_offset: attr_f64(&scmi, "add_offset").unwrap_or(0.0),
            fill_value: attr_f64(&scmi, "_FillValue"),
        };
        let fill_replacement = (fix_clipped && sattype == SatType::Vis).then_some(1.0);
        let data = packing.unpack(&raw, fill_replacement);

        let data_units = match attr_str(&scmi, "units") {
            Some(u) => units::get(&u).ok(),
            None => None,
        };
        debug!(pixels = data.len(), units = ?data_units, "Unpacked SCMI pixels");

        let grid = SatelliteGrid {
            sattype,
            timestamp: self.timestamp,
            projection: self.projection.clone(),
            x,
            y,
            data,
            units: data_units,
        };
        grid.check_shape()?;
        Ok(grid)
    }
}

fn read_axis(handle: &DatasetHandle, name: &str, altitude: f64) -> WxResult<Vec<f64>> {
    let var = handle.variable(name)?;
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", name, e)))?;
    Ok(scale_axis(values, attr_str(&var, "units").as_deref(), altitude))
}

/// Full-disk coordinates come in microradians; scale them by the satellite
/// altitude to get meters. Projected tiles are already in meters.
fn scale_axis(values: Vec<f64>, units: Option<&str>, altitude: f64) -> Vec<f64> {
    match units {
        Some("microradian") => values.into_iter().map(|v| v * altitude / 1e6).collect(),
        _ => values,
    }
}

fn parse_start_date_time(s: &str) -> WxResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y%j%H%M%S")
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|e| WxError::NetCdf(format!("Invalid start_date_time '{}': {}", s, e)))
}

/// Build a projection from the attributes of a named grid mapping variable.
pub(crate) fn projection_from_mapping(
    mapping: &str,
    attr: impl Fn(&str) -> Option<Vec<f64>>,
) -> WxResult<Projection> {
    let first = |name: &str| {
        attr(name)
            .and_then(|v| v.first().copied())
            .ok_or_else(|| WxError::NetCdf(format!("{} is missing '{}'", mapping, name)))
    };
    let first_or = |name: &str, default: f64| attr(name).and_then(|v| v.first().copied()).unwrap_or(default);

    match mapping {
        "lambert_projection" => {
            let parallels = attr("standard_parallel")
                .ok_or_else(|| WxError::NetCdf(format!("{} is missing 'standard_parallel'", mapping)))?;
            let lambert = LambertConformal::new(
                first("latitude_of_projection_origin")?,
                first("longitude_of_central_meridian")?,
                &parallels,
                first("semi_major")?,
            )?
            .with_false_origin(first_or("false_easting", 0.0), first_or("false_northing", 0.0));
            Ok(lambert.into())
        }
        "fixedgrid_projection" => Ok(Geostationary::new(
            first("perspective_point_height")?,
            first("semi_major")?,
            first("semi_minor")?,
            first("longitude_of_projection_origin")?,
            "x",
        )?
        .into()),
        "mercator_projection" => Ok(Mercator::new(
            first("longitude_of_projection_origin")?,
            first("standard_parallel")?,
            first("semi_major")?,
        )
        .into()),
        other => Err(WxError::NetCdf(format!("Projection: {} not supported at this time", other))),
    }
}

/// CF packing attributes of a 16-bit variable.
struct Packing {
    unsigned: bool,
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
}

impl Packing {
    fn stored(&self, raw: i16) -> f64 {
        if self.unsigned {
            raw as u16 as f64
        } else {
            raw as f64
        }
    }

    fn unpack(&self, raw: &[i16], fill_replacement: Option<f32>) -> Vec<f32> {
        // The fill attribute is written in the storage type, so reinterpret
        // it the same way as the data.
        let fill = self.fill_value.map(|f| self.stored(f as i16));
        raw.iter()
            .map(|&r| {
                let stored = self.stored(r);
                if Some(stored) == fill {
                    fill_replacement.unwrap_or(f32::NAN)
                } else {
                    (stored * self.scale_factor + self.add_offset) as f32
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use projection::MapProjection;

    #[test]
    fn test_channel_sattypes() {
        let expected = [
            (1, SatType::Vis),
            (2, SatType::Vis),
            (3, SatType::NearIr),
            (6, SatType::NearIr),
            (7, SatType::Ir),
            (8, SatType::Wv),
            (10, SatType::Wv),
            (11, SatType::Ir),
            (16, SatType::Ir),
        ];
        for (channel, sattype) in expected {
            assert_eq!(sattype_for_channel(channel).unwrap(), sattype, "channel {}", channel);
        }
        assert!(sattype_for_channel(0).is_err());
        assert!(sattype_for_channel(17).is_err());
    }

    #[test]
    fn test_start_date_time_is_day_of_year() {
        let t = parse_start_date_time("2017169004719").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2017, 6, 18, 0, 47, 19).unwrap());
        assert_eq!(t.hour(), 0);
        assert!(parse_start_date_time("20170618").is_err());
    }

    #[test]
    fn test_microradian_axis_scaling() {
        let scaled = scale_axis(vec![-1000.0, 0.0, 1000.0], Some("microradian"), 35_786_023.0);
        assert!((scaled[0] + 35_786.023).abs() < 1e-6);
        assert_eq!(scaled[1], 0.0);
        let meters = scale_axis(vec![5.0], Some("m"), 35_786_023.0);
        assert_eq!(meters, vec![5.0]);
    }

    #[test]
    fn test_unsigned_packing_and_fill() {
        let packing = Packing {
            unsigned: true,
            scale_factor: 0.5,
            add_offset: 100.0,
            fill_value: Some(-1.0),
        };
        let out = packing.unpack(&[0, 10, -1, -2], None);
        assert_eq!(out[0], 100.0);
        assert_eq!(out[1], 105.0);
        assert!(out[2].is_nan());
        assert_eq!(out[3], (65534.0 * 0.5 + 100.0) as f32);

        let clipped = packing.unpack(&[-1], Some(1.0));
        assert_eq!(clipped, vec![1.0]);
    }

    #[test]
    fn test_signed_packing() {
        let packing = Packing {
            unsigned: false,
            scale_factor: 2.0,
            add_offset: 0.0,
            fill_value: None,
        };
        assert_eq!(packing.unpack(&[-3, 4], None), vec![-6.0, 8.0]);
    }

    fn mapping_attrs(name: &str) -> Option<Vec<f64>> {
        let value = match name {
            "semi_major" => 6_371_200.0,
            "semi_minor" => 6_356_752.31414,
            "latitude_of_projection_origin" => 25.0,
            "longitude_of_central_meridian" => -95.0,
            "longitude_of_projection_origin" => -75.0,
            "standard_parallel" => 25.0,
            "perspective_point_height" => 35_786_023.0,
            "false_easting" | "false_northing" => 0.0,
            _ => return None,
        };
        Some(vec![value])
    }

    #[test]
    fn test_projection_from_each_mapping() {
        let lambert = projection_from_mapping("lambert_projection", mapping_attrs).unwrap();
        assert!(matches!(lambert, Projection::Lambert(_)));
        let (x, y) = lambert.project(-95.0, 25.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

        let fixed = projection_from_mapping("fixedgrid_projection", mapping_attrs).unwrap();
        assert!(matches!(fixed, Projection::Geostationary(_)));
        let (x, y) = fixed.project(-75.0, 0.0).unwrap();
        assert!(x.abs() < 1e-3 && y.abs() < 1e-3);

        let mercator = projection_from_mapping("mercator_projection", mapping_attrs).unwrap();
        assert!(matches!(mercator, Projection::Mercator(_)));
    }

    #[test]
    fn test_unsupported_mapping() {
        let err = projection_from_mapping("polar_stereographic", mapping_attrs).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_mapping_missing_attribute() {
        let err = projection_from_mapping("fixedgrid_projection", |_| None).unwrap_err();
        assert!(matches!(err, WxError::NetCdf(_)));
    }
}
