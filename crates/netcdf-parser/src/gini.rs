//! Legacy GOES GINI imagery served through THREDDS.
//!
//! A GINI file holds one 8-bit frame named after its `keywords_vocabulary`
//! (`VIS`, `IR` or `IR_WV`), a single-entry `time` variable, kilometre `x`/`y`
//! coordinates and a `LambertConformal` grid mapping.

use projection::LambertConformal;
use tracing::{debug, info};
use wx_common::units::{CELSIUS, KELVIN, KILOMETER, METER};
use wx_common::{Unit, WxError, WxResult};

use crate::cf_time::CfTimeUnits;
use crate::handle::{attr_f64s, attr_str, DatasetHandle};
use crate::{SatType, SatelliteGrid};

/// Brightness temperature of an 8-bit GINI IR count, after
/// <http://www.goes.noaa.gov/enhanced.html>.
///
/// Counts of 176 and above map linearly at 1 K per count, lower counts at
/// half a kelvin per count.
pub fn pixel_to_temp(pixel: u8, unit: &Unit) -> WxResult<f64> {
    let pixel = pixel as f64;
    let kelvin = if pixel >= 176.0 { 418.0 - pixel } else { 330.0 - pixel / 2.0 };
    KELVIN.convert(kelvin, unit)
}

/// Decode a GINI file or OPeNDAP endpoint into a grid in meters.
pub fn load_gini(source: &str) -> WxResult<SatelliteGrid> {
    let handle = DatasetHandle::open(source)?;

    let keyword = handle.global_str("keywords_vocabulary")?;
    let sattype: SatType = keyword.parse()?;

    let timestamp = {
        let var = handle.variable("time")?;
        let values = var
            .get_values::<f64, _>(..)
            .map_err(|e| WxError::NetCdf(format!("Failed to read time: {}", e)))?;
        if values.len() != 1 {
            return Err(WxError::NetCdf(format!(
                "Invalid dataset: expected one timestamp, found {}",
                values.len()
            )));
        }
        let units = attr_str(&var, "units");
        CfTimeUnits::parse_or_epoch(units.as_deref()).to_datetime(values[0])?
    };

    let projection = {
        let geog = handle.variable("LambertConformal")?;
        lambert_from_attrs(|name| Some(attr_f64s(&geog, name)).filter(|v| !v.is_empty()))?
    };

    let x = read_km_axis(&handle, "x")?;
    let y = read_km_axis(&handle, "y")?;

    let raw = {
        let var = handle.variable(&keyword)?;
        let frames = var.dimensions().first().map(|d| d.len()).unwrap_or(0);
        if frames != 1 {
            return Err(WxError::NetCdf(format!(
                "Invalid dataset: expected one frame of '{}', found {}",
                keyword, frames
            )));
        }
        var.get_values::<i8, _>(..)
            .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", keyword, e)))?
    };
    let (data, units) = decode_pixels(&raw, sattype)?;
    debug!(pixels = data.len(), sattype = %sattype, "Decoded GINI pixels");

    let grid = SatelliteGrid {
        sattype,
        timestamp,
        projection: projection.into(),
        x,
        y,
        data,
        units,
    };
    grid.check_shape()?;

    info!(source = %source, sattype = %sattype, timestamp = %timestamp, "Finished reading GINI image");
    Ok(grid)
}

fn read_km_axis(handle: &DatasetHandle, name: &str) -> WxResult<Vec<f64>> {
    let var = handle.variable(name)?;
    let values = var
        .get_values::<f64, _>(..)
        .map_err(|e| WxError::NetCdf(format!("Failed to read {}: {}", name, e)))?;
    values.into_iter().map(|v| KILOMETER.convert(v, &METER)).collect()
}

/// Build the Lambert conformal mapping from `LambertConformal` attributes.
pub(crate) fn lambert_from_attrs(
    attr: impl Fn(&str) -> Option<Vec<f64>>,
) -> WxResult<LambertConformal> {
    let first = |name: &str| {
        attr(name)
            .and_then(|v| v.first().copied())
            .ok_or_else(|| WxError::NetCdf(format!("LambertConformal is missing '{}'", name)))
    };
    let parallels = attr("standard_parallel")
        .ok_or_else(|| WxError::NetCdf("LambertConformal is missing 'standard_parallel'".into()))?;

    LambertConformal::new(
        first("latitude_of_projection_origin")?,
        first("longitude_of_central_meridian")?,
        &parallels,
        first("earth_radius")?,
    )
}

/// Mask signed storage back to 0..=255 counts; IR counts become °C.
fn decode_pixels(raw: &[i8], sattype: SatType) -> WxResult<(Vec<f32>, Option<Unit>)> {
    let counts = raw.iter().map(|&p| (p as i16 & 0xff) as u8);
    match sattype {
        SatType::Ir => {
            let temps = counts
                .map(|p| pixel_to_temp(p, &CELSIUS).map(|t| t as f32))
                .collect::<WxResult<Vec<_>>>()?;
            Ok((temps, Some(CELSIUS)))
        }
        _ => Ok((counts.map(f32::from).collect(), None)),
    }
}
