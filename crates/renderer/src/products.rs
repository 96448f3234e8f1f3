//! Default maps and colortables for each product family.

use std::path::Path;
use std::sync::Arc;

use colortables::{Colortable, PaletteRepos, Rgba as Color};
use netcdf_parser::{Goes16Scan, RadarType, SatType};
use projection::{LambertConformal, Projection, EARTH_RADIUS_M};
use wx_common::geo::zoom;
use wx_common::{GeoBBox, Scale, WxResult};

use crate::mapper::{MapLayer, Mapper};

/// Half-width of the default view around a mesoscale sector.
pub const MESO_ZOOM_KM: f64 = 600.0;

/// Standard parallels of the station-centred radar map.
const RADAR_PARALLELS: [f64; 2] = [33.0, 45.0];

/// Palette label (`group.label`) used when none is given for a GOES-16 band.
pub fn goes16_colortable(sattype: SatType) -> &'static str {
    match sattype {
        SatType::Vis | SatType::NearIr => "vis.optimized",
        SatType::Ir => "ir.alpha",
        SatType::Wv => "wv.accuwx",
    }
}

/// Data range of a GOES-16 band that has no physical unit.
pub fn goes16_scale(sattype: SatType) -> Option<Scale> {
    match sattype {
        SatType::Vis | SatType::NearIr => Some(Scale::unity()),
        SatType::Ir | SatType::Wv => None,
    }
}

/// Palette label used when none is given for a legacy GINI frame.
pub fn gini_colortable(sattype: SatType) -> &'static str {
    match sattype {
        SatType::Vis | SatType::NearIr => "vis.default",
        SatType::Ir => "ir.alpha",
        SatType::Wv => "wv.accuwx",
    }
}

/// Palette label for a radar moment; moments without one can't be drawn
/// without an explicit colortable.
pub fn radar_colortable(radar_type: RadarType) -> Option<&'static str> {
    match radar_type {
        RadarType::Reflectivity => Some("reflectivity.nws_default"),
        RadarType::RadialVelocity => Some("velocity.default"),
        RadarType::DifferentialReflectivity => Some("diff_reflectivity.default"),
        _ => None,
    }
}

/// Resolve an explicit palette label or fall back to `default`.
pub fn resolve_colortable(
    repos: &PaletteRepos,
    explicit: Option<&str>,
    default: Option<&str>,
) -> WxResult<Option<Arc<Colortable>>> {
    match explicit.or(default) {
        Some(label) => repos.lookup(label).map(Some),
        None => Ok(None),
    }
}

/// Map for a GOES-16 scan in the scan's own projection. Mesoscale sectors are
/// zoomed around the product centre; other sectors show the whole frame.
pub fn goes16_map(scan: &Goes16Scan, shapefile_dir: &Path) -> WxResult<Mapper> {
    let mut mapper = Mapper::new(scan.projection.clone(), shapefile_dir);
    if scan.meso_sector {
        let center = (scan.product_center.latitude, scan.product_center.longitude);
        mapper.set_extent(zoom(center, MESO_ZOOM_KM)?);
    }
    let black = Color::rgb(0, 0, 0);
    for layer in [MapLayer::Borders, MapLayer::States] {
        let props = mapper.layer_mut(layer);
        props.stroke_color = black;
        props.alpha = 0.75;
    }
    let counties = mapper.layer_mut(MapLayer::Counties);
    counties.stroke_color = black;
    counties.alpha = 0.4;
    let roads = mapper.layer_mut(MapLayer::Highways);
    roads.stroke_color = Color::rgb(255, 0, 0);
    roads.alpha = 0.3;
    Ok(mapper)
}

/// Map for a legacy GINI frame: coastlines, borders and states only.
pub fn gini_map(projection: Projection, shapefile_dir: &Path) -> Mapper {
    let mut mapper = Mapper::new(projection, shapefile_dir);
    mapper.layer_mut(MapLayer::Counties).visible = false;
    mapper.layer_mut(MapLayer::Highways).visible = false;
    mapper
}

/// Station-centred Lambert map on a black background covering the volume.
pub fn radar_map(station: (f64, f64), extent: GeoBBox, shapefile_dir: &Path) -> WxResult<Mapper> {
    let (lat, lon) = station;
    let lambert = LambertConformal::new(lat, lon, &RADAR_PARALLELS, EARTH_RADIUS_M)?;
    Ok(Mapper::detailed_us(lambert, shapefile_dir)
        .with_background(Color::rgb(0, 0, 0))
        .with_extent(extent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use netcdf_parser::Position3d;
    use projection::{Geostationary, MapProjection};

    #[test]
    fn test_default_colortables() {
        assert_eq!(goes16_colortable(SatType::NearIr), "vis.optimized");
        assert_eq!(goes16_colortable(SatType::Ir), "ir.alpha");
        assert_eq!(goes16_scale(SatType::Vis), Some(Scale::unity()));
        assert_eq!(goes16_scale(SatType::Ir), None);
        assert_eq!(gini_colortable(SatType::Vis), "vis.default");
        assert_eq!(gini_colortable(SatType::Wv), "wv.accuwx");
        assert_eq!(radar_colortable(RadarType::RadialVelocity), Some("velocity.default"));
        assert_eq!(radar_colortable(RadarType::SpectrumWidth), None);
    }

    #[test]
    fn test_resolve_colortable_without_label() {
        let repos = PaletteRepos::new("/nonexistent");
        assert!(resolve_colortable(&repos, None, None).unwrap().is_none());
        assert!(resolve_colortable(&repos, Some("nope.nope"), None).is_err());
    }

    fn scan(meso: bool) -> Goes16Scan {
        let position = Position3d {
            latitude: 0.0,
            longitude: -75.0,
            altitude: Some(35_786_023.0),
        };
        Goes16Scan {
            source: "scan.nc".into(),
            channel: 2,
            timestamp: Utc.with_ymd_and_hms(2017, 6, 18, 0, 47, 19).unwrap(),
            satellite_position: position,
            product_center: Position3d {
                latitude: 33.3,
                longitude: -91.4,
                altitude: None,
            },
            meso_sector: meso,
            projection: Geostationary::goes_east().into(),
        }
    }

    #[test]
    fn test_goes16_map_zooms_meso_sectors() {
        let dir = Path::new("/nonexistent");
        let meso = goes16_map(&scan(true), dir).unwrap();
        let extent = meso.extent.unwrap();
        assert!(extent.contains(-91.4, 33.3));
        assert!(extent.width() > 10.0 && extent.width() < 20.0);
        assert_eq!(meso.layer(MapLayer::Counties).alpha, 0.4);
        assert_eq!(meso.layer(MapLayer::Highways).stroke_color, Color::rgb(255, 0, 0));

        assert!(goes16_map(&scan(false), dir).unwrap().extent.is_none());
    }

    #[test]
    fn test_radar_map_centres_on_station() {
        let station = (37.155, -121.898);
        let extent = GeoBBox::new(-125.0, -119.0, 34.5, 39.8);
        let mapper = radar_map(station, extent, Path::new("/nonexistent")).unwrap();
        assert_eq!(mapper.bg_color, Color::rgb(0, 0, 0));
        assert!(!mapper.layer(MapLayer::Coastlines).visible);
        let (x, _) = mapper.projection.project(station.1, station.0).unwrap();
        assert!(x.abs() < 1e-6);
    }
}
