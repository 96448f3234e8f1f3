//! Rasterization of decoded products onto a map canvas.
//!
//! Both paths work backwards from the output: every canvas pixel is
//! unprojected to a geographic point and looked up in the source grid, so
//! the product can be drawn on any map projection. Rows are colored in
//! parallel and composited afterwards.

use colortables::Colortable;
use netcdf_parser::{RadarSweep, SatType, SatelliteGrid};
use projection::{MapProjection, ProjectedBounds};
use rayon::prelude::*;
use tracing::{debug, info};
use wx_common::geo::bearing_and_distance;
use wx_common::units::{CELSIUS, KELVIN};
use wx_common::{Scale, Unit, WxError, WxResult};

use crate::canvas::Canvas;
use crate::mapper::{Mapper, Viewport};

/// How data values become colortable values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueMapping {
    Identity,
    Convert { from: Unit, to: Unit },
    Rescale { from: Scale, to: Scale },
}

impl ValueMapping {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ValueMapping::Identity => value,
            ValueMapping::Convert { from, to } => from.convert(value, to).unwrap_or(f64::NAN),
            ValueMapping::Rescale { from, to } => from.remap(value, to),
        }
    }
}

/// Pick how satellite values map onto `table`.
///
/// Brightness tables are expressed as a `Scale`. Unitless data (reflectance)
/// is stretched onto them from `scale` when one is given; physical data is
/// fitted onto the reversed table through `scale`, which defaults to
/// -130..10 °C for water vapour in kelvin.
pub fn satellite_mapping(
    grid: &SatelliteGrid,
    table: &Colortable,
    scale: Option<Scale>,
) -> WxResult<ValueMapping> {
    let table_unit = table.unit();
    match (grid.units, table_unit) {
        (None, Unit::Scale(table_scale)) => Ok(match scale {
            Some(from) => ValueMapping::Rescale { from, to: table_scale },
            None => ValueMapping::Identity,
        }),
        (None, _) => Ok(ValueMapping::Identity),
        (Some(data), to) if data == to => Ok(ValueMapping::Identity),
        (Some(Unit::Named(_)), Unit::Scale(table_scale)) => {
            let from = match scale {
                Some(s) => s,
                None if grid.sattype == SatType::Wv && grid.units == Some(KELVIN) => Scale::new(
                    CELSIUS.convert(-130.0, &KELVIN)?,
                    CELSIUS.convert(10.0, &KELVIN)?,
                )?,
                None => {
                    return Err(WxError::invalid("Must provide explicit scale for this dataset."))
                }
            };
            Ok(ValueMapping::Rescale {
                from,
                to: table_scale.reverse(),
            })
        }
        (Some(from), to) => {
            // reject unsupported pairs up front rather than per pixel
            from.convert(0.0, &to)
                .map_err(|_| WxError::Units(format!("Unsupported plotting units: {}", from)))?;
            Ok(ValueMapping::Convert { from, to })
        }
    }
}

/// Projected bounds of a grid in its own projection.
pub fn grid_bounds(grid: &SatelliteGrid) -> ProjectedBounds {
    let (xmin, xmax, ymin, ymax) = grid.extent();
    ProjectedBounds { xmin, xmax, ymin, ymax }
}

/// Index of the sample nearest `v` on an evenly spaced axis.
fn axis_index(axis: &[f64], v: f64) -> Option<usize> {
    let n = axis.len();
    if n == 0 || !v.is_finite() {
        return None;
    }
    if n == 1 {
        return ((v - axis[0]).abs() < f64::EPSILON).then_some(0);
    }
    let step = (axis[n - 1] - axis[0]) / (n - 1) as f64;
    if step == 0.0 {
        return None;
    }
    let pos = ((v - axis[0]) / step).round();
    (pos >= 0.0 && pos < n as f64).then_some(pos as usize)
}

/// Draw a satellite frame. Missing pixels and pixels outside the frame are
/// left untouched.
pub fn draw_satellite(
    canvas: &mut Canvas,
    mapper: &Mapper,
    viewport: &Viewport,
    grid: &SatelliteGrid,
    table: &Colortable,
    mapping: ValueMapping,
) -> WxResult<()> {
    let same_projection = mapper.projection == grid.projection;
    let width = viewport.width;

    let rows: Vec<Vec<Option<[u8; 4]>>> = (0..viewport.height)
        .into_par_iter()
        .map(|row| {
            (0..width)
                .map(|col| {
                    let (x, y) = viewport.to_projected(col, row);
                    let (gx, gy) = if same_projection {
                        (x, y)
                    } else {
                        let (lon, lat) = mapper.projection.unproject(x, y)?;
                        grid.projection.project(lon, lat)?
                    };
                    let value = grid.value(axis_index(&grid.y, gy)?, axis_index(&grid.x, gx)?)?;
                    if value.is_nan() {
                        return None;
                    }
                    Some(table.color_for(mapping.apply(value as f64)).to_rgba8())
                })
                .collect()
        })
        .collect();

    let painted = composite(canvas, rows);
    info!(sattype = %grid.sattype, painted = painted, "Finished drawing satellite image");
    Ok(())
}

/// Nearest-radial lookup over possibly unsorted azimuths.
struct AzimuthIndex {
    sorted: Vec<(f64, usize)>,
    tolerance: f64,
}

impl AzimuthIndex {
    fn new(azimuths: &[f64]) -> Self {
        let mut sorted: Vec<(f64, usize)> = azimuths
            .iter()
            .enumerate()
            .filter(|(_, az)| az.is_finite())
            .map(|(i, az)| (az.rem_euclid(360.0), i))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let tolerance = if sorted.is_empty() { 0.0 } else { 360.0 / sorted.len() as f64 };
        Self { sorted, tolerance }
    }

    fn nearest(&self, azimuth: f64) -> Option<usize> {
        if self.sorted.is_empty() {
            return None;
        }
        let split = self.sorted.partition_point(|(az, _)| *az < azimuth);
        let n = self.sorted.len();
        // neighbours on both sides, wrapping through north
        let candidates = [self.sorted[split % n], self.sorted[(split + n - 1) % n]];
        candidates
            .into_iter()
            .map(|(az, i)| {
                let d = (az - azimuth).abs();
                (d.min(360.0 - d), i)
            })
            .filter(|(d, _)| *d <= self.tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, i)| i)
    }
}

fn gate_index(ranges: &[f64], meters: f64) -> Option<usize> {
    let n = ranges.len();
    if n < 2 {
        return None;
    }
    let step = (ranges[n - 1] - ranges[0]) / (n - 1) as f64;
    if step <= 0.0 {
        return None;
    }
    // gate distances mark bin centres
    let pos = ((meters - ranges[0]) / step).round();
    (pos >= 0.0 && pos < n as f64).then_some(pos as usize)
}

/// Draw a radar sweep. With `clip_km`, gates beyond that distance from the
/// station are not drawn.
pub fn draw_radar(
    canvas: &mut Canvas,
    mapper: &Mapper,
    viewport: &Viewport,
    sweep: &RadarSweep,
    table: &Colortable,
    clip_km: Option<f64>,
) -> WxResult<()> {
    let table = match sweep.units {
        Some(units) if units != table.unit() => table.convert(&units)?,
        _ => table.clone(),
    };
    let azimuths = AzimuthIndex::new(&sweep.azimuths);
    let (lat, lon) = sweep.station_location;
    let width = viewport.width;

    let rows: Vec<Vec<Option<[u8; 4]>>> = (0..viewport.height)
        .into_par_iter()
        .map(|row| {
            (0..width)
                .map(|col| {
                    let (x, y) = viewport.to_projected(col, row);
                    let point = mapper.projection.unproject(x, y)?;
                    let (bearing, km) = bearing_and_distance((lon, lat), point);
                    if clip_km.map(|limit| km > limit).unwrap_or(false) {
                        return None;
                    }
                    let radial = azimuths.nearest(bearing)?;
                    let bin = gate_index(&sweep.ranges, km * 1000.0)?;
                    let value = sweep.gate(radial, bin)?;
                    if value.is_nan() {
                        return None;
                    }
                    Some(table.color_for(value as f64).to_rgba8())
                })
                .collect()
        })
        .collect();

    let painted = composite(canvas, rows);
    info!(
        station = %sweep.station,
        radar_type = %sweep.radar_type,
        painted = painted,
        "Finished drawing radar sweep"
    );
    Ok(())
}

fn composite(canvas: &mut Canvas, rows: Vec<Vec<Option<[u8; 4]>>>) -> usize {
    let mut painted = 0;
    for (row, colors) in rows.into_iter().enumerate() {
        for (col, color) in colors.into_iter().enumerate() {
            if let Some(c) = color {
                canvas.blend(col as i64, row as i64, c);
                painted += 1;
            }
        }
    }
    debug!(painted = painted, "Composited layer");
    painted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use colortables::{PaletteEntry, Rgba as Color};
    use netcdf_parser::RadarType;
    use projection::PlateCarree;
    use wx_common::units::{DBZ, KNOT, METER_PER_SECOND};
    use wx_common::GeoBBox;

    fn ramp(unit: Option<Unit>) -> Colortable {
        let entries = vec![
            PaletteEntry::new(0.0, vec![Color::rgb(0, 0, 0)]),
            PaletteEntry::new(100.0, vec![Color::rgb(255, 255, 255)]),
        ];
        Colortable::new("ramp", entries, unit).unwrap()
    }

    fn grid(units: Option<Unit>, sattype: SatType) -> SatelliteGrid {
        SatelliteGrid {
            sattype,
            timestamp: Utc.with_ymd_and_hms(2016, 1, 28, 7, 45, 0).unwrap(),
            projection: PlateCarree::default().into(),
            x: vec![-1.5, -0.5, 0.5, 1.5],
            y: vec![1.5, 0.5, -0.5, -1.5],
            data: vec![
                0.0, 0.0, 100.0, 100.0, //
                0.0, 0.0, 100.0, 100.0, //
                f32::NAN, f32::NAN, 50.0, 50.0, //
                f32::NAN, f32::NAN, 50.0, 50.0,
            ],
            units,
        }
    }

    #[test]
    fn test_axis_index() {
        let asc = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(axis_index(&asc, 1.4), Some(1));
        assert_eq!(axis_index(&asc, -0.6), None);
        let desc = [3.0, 2.0, 1.0, 0.0];
        assert_eq!(axis_index(&desc, 2.9), Some(0));
        assert_eq!(axis_index(&desc, 0.2), Some(3));
        assert_eq!(axis_index(&[], 0.0), None);
    }

    #[test]
    fn test_satellite_mapping_choices() {
        let raw = grid(None, SatType::Vis);
        assert_eq!(satellite_mapping(&raw, &ramp(None), None).unwrap(), ValueMapping::Identity);
        let reflectance = satellite_mapping(&raw, &ramp(None), Some(Scale::unity())).unwrap();
        assert!((reflectance.apply(0.25) - 25.0).abs() < 1e-9);

        let celsius = grid(Some(CELSIUS), SatType::Ir);
        let mapping = satellite_mapping(&celsius, &ramp(Some(KELVIN)), None).unwrap();
        assert!((mapping.apply(0.0) - 273.15).abs() < 1e-9);

        let wv = grid(Some(KELVIN), SatType::Wv);
        let mapping = satellite_mapping(&wv, &ramp(None), None).unwrap();
        // -130 °C lands on the top of the reversed brightness scale
        assert!((mapping.apply(143.15) - 100.0).abs() < 1e-6);
        assert!((mapping.apply(283.15) - 0.0).abs() < 1e-6);

        let ir_kelvin = grid(Some(KELVIN), SatType::Ir);
        assert!(satellite_mapping(&ir_kelvin, &ramp(None), None).is_err());
        assert!(satellite_mapping(&celsius, &ramp(Some(KNOT)), None).is_err());
    }

    #[test]
    fn test_draw_satellite_colors_and_skips_missing() {
        let data = grid(None, SatType::Vis);
        let mapper = Mapper::new(PlateCarree::default(), "/nonexistent")
            .with_background(Color::rgb(9, 9, 9))
            .with_extent(GeoBBox::new(-2.0, 2.0, -2.0, 2.0));
        let viewport = mapper.viewport(4, None).unwrap();
        let mut canvas = mapper.new_canvas(&viewport);
        draw_satellite(&mut canvas, &mapper, &viewport, &data, &ramp(None), ValueMapping::Identity).unwrap();

        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(3, 0), Some([255, 255, 255, 255]));
        // NaN leaves the background
        assert_eq!(canvas.pixel(0, 3), Some([9, 9, 9, 255]));
        let mid = canvas.pixel(3, 3).unwrap();
        assert!((mid[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_azimuth_index_wraps_north() {
        let index = AzimuthIndex::new(&[90.0, 359.5, 180.0, 270.0, 0.5]);
        assert!(matches!(index.nearest(0.0), Some(1) | Some(4)));
        assert_eq!(index.nearest(359.9), Some(1));
        assert_eq!(index.nearest(0.4), Some(4));
        assert_eq!(index.nearest(181.0), Some(2));
    }

    #[test]
    fn test_gate_index() {
        let ranges = [2125.0, 2375.0, 2625.0, 2875.0];
        assert_eq!(gate_index(&ranges, 2125.0), Some(0));
        assert_eq!(gate_index(&ranges, 2600.0), Some(2));
        assert_eq!(gate_index(&ranges, 5000.0), None);
        assert_eq!(gate_index(&ranges, 1000.0), None);
    }

    fn sweep() -> RadarSweep {
        // 4 radials, 40 bins of 1 km starting at 0.5 km
        let ranges: Vec<f64> = (0..40).map(|i| 500.0 + i as f64 * 1000.0).collect();
        let mut gates = vec![f32::NAN; 4 * 40];
        for bin in 0..40 {
            gates[bin] = 10.0; // north
            gates[2 * 40 + bin] = 90.0; // south
        }
        RadarSweep {
            station: "KTST".into(),
            station_location: (35.0, -97.0),
            radar_type: RadarType::Reflectivity,
            hires: false,
            sweep: 0,
            timestamp: Utc.with_ymd_and_hms(2017, 7, 15, 23, 33, 0).unwrap(),
            azimuths: vec![0.0, 90.0, 180.0, 270.0],
            ranges,
            gates,
            units: Some(DBZ),
        }
    }

    #[test]
    fn test_draw_radar_by_bearing_and_range() {
        let mapper = Mapper::new(PlateCarree::default(), "/nonexistent")
            .with_background(Color::rgb(9, 9, 9))
            .with_extent(GeoBBox::new(-97.3, -96.7, 34.7, 35.3));
        let viewport = mapper.viewport(30, None).unwrap();
        let mut canvas = mapper.new_canvas(&viewport);
        draw_radar(&mut canvas, &mapper, &viewport, &sweep(), &ramp(Some(DBZ)), None).unwrap();

        // directly north of the station, about 22 km out
        let north = canvas.pixel(15, 5).unwrap();
        assert!((north[0] as i32 - 26).abs() <= 1);
        // directly south
        let south = canvas.pixel(15, 25).unwrap();
        assert!((south[0] as i32 - 230).abs() <= 1);
        // east radial is all missing
        assert_eq!(canvas.pixel(25, 15), Some([9, 9, 9, 255]));
    }

    #[test]
    fn test_draw_radar_clip_and_unit_conversion() {
        let mapper = Mapper::new(PlateCarree::default(), "/nonexistent")
            .with_background(Color::rgb(9, 9, 9))
            .with_extent(GeoBBox::new(-97.3, -96.7, 34.7, 35.3));
        let viewport = mapper.viewport(30, None).unwrap();

        let mut clipped = mapper.new_canvas(&viewport);
        draw_radar(&mut clipped, &mapper, &viewport, &sweep(), &ramp(Some(DBZ)), Some(10.0)).unwrap();
        assert_eq!(clipped.pixel(15, 5), Some([9, 9, 9, 255]));

        let mut velocity = sweep();
        velocity.units = Some(METER_PER_SECOND);
        let mut canvas = mapper.new_canvas(&viewport);
        // a knot table is converted to the sweep's m/s before lookup
        draw_radar(&mut canvas, &mapper, &viewport, &velocity, &ramp(Some(KNOT)), None).unwrap();
        let north = canvas.pixel(15, 5).unwrap();
        // 10 m/s is ~19.4 kt on a 0-100 kt ramp
        assert!((north[0] as i32 - 50).abs() <= 2);
    }
}
