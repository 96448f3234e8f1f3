//! Geographic helpers: bounding boxes, great-circle destination points and
//! named map extents.

use serde::{Deserialize, Serialize};

use crate::error::{WxError, WxResult};
use crate::units::{self, Unit};

/// Mean Earth radius used for destination point calculations, in km.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Geographic bounding box in degrees (west, east, south, north).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoBBox {
    pub const fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self { west, east, south, north }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// Smallest box enclosing all `(lon, lat)` points.
    pub fn from_coords<I>(coords: I) -> WxResult<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = coords.into_iter();
        let (lon, lat) = iter
            .next()
            .ok_or_else(|| WxError::invalid("cannot build a bounding box from no points"))?;
        let init = Self::new(lon, lon, lat, lat);
        Ok(iter.fold(init, |b, (lon, lat)| Self {
            west: b.west.min(lon),
            east: b.east.max(lon),
            south: b.south.min(lat),
            north: b.north.max(lat),
        }))
    }

    /// Box reaching `dist` (in `dist_unit`) west, east, south and north of a
    /// `(lat, lon)` center.
    pub fn from_center_and_range(center: (f64, f64), dist: f64, dist_unit: Unit) -> WxResult<Self> {
        let (lat, lon) = center;
        let (west, _) = destination_point(lon, lat, dist, 270.0, dist_unit)?;
        let (east, _) = destination_point(lon, lat, dist, 90.0, dist_unit)?;
        let (_, south) = destination_point(lon, lat, dist, 180.0, dist_unit)?;
        let (_, north) = destination_point(lon, lat, dist, 0.0, dist_unit)?;
        Ok(Self::new(west, east, south, north))
    }
}

impl From<(f64, f64, f64, f64)> for GeoBBox {
    fn from(t: (f64, f64, f64, f64)) -> Self {
        Self::new(t.0, t.1, t.2, t.3)
    }
}

/// Point reached travelling `distance` from `(lon, lat)` on initial
/// `bearing` degrees along a great circle. Returns `(lon, lat)` in degrees.
pub fn destination_point(
    lon: f64,
    lat: f64,
    distance: f64,
    bearing: f64,
    dist_unit: Unit,
) -> WxResult<(f64, f64)> {
    let distance = dist_unit.convert(distance, &units::KILOMETER)?;
    let angular = distance / EARTH_RADIUS_KM;

    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let bearing_rad = bearing.to_radians();

    let lat2 = (lat_rad.sin() * angular.cos() + lat_rad.cos() * angular.sin() * bearing_rad.cos()).asin();
    let lon2 = lon_rad
        + (bearing_rad.sin() * angular.sin() * lat_rad.cos())
            .atan2(angular.cos() - lat_rad.sin() * lat2.sin());

    Ok((lon2.to_degrees(), lat2.to_degrees()))
}

/// Initial great-circle bearing (degrees clockwise from north, `[0, 360)`)
/// and distance in kilometres from `from` to `to`, both `(lon, lat)`.
pub fn bearing_and_distance(from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
    let (lon1, lat1) = (from.0.to_radians(), from.1.to_radians());
    let (lon2, lat2) = (to.0.to_radians(), to.1.to_radians());
    let dlon = lon2 - lon1;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);

    let a = ((lat2 - lat1) / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let distance = 2.0 * a.sqrt().min(1.0).asin() * EARTH_RADIUS_KM;

    (bearing, distance)
}

/// Position of `val` within `[min, max]` as a fraction.
pub fn relative_percentage(val: f64, min: f64, max: f64) -> f64 {
    (val - min) / (max - min)
}

/// Extent of `km` kilometers around a `(lat, lon)` center.
pub fn zoom(center: (f64, f64), km: f64) -> WxResult<GeoBBox> {
    GeoBBox::from_center_and_range(center, km, units::KILOMETER)
}

/// Named map extents.
pub mod extents {
    use super::GeoBBox;

    pub const CONUS: GeoBBox = GeoBBox::new(-127.5, -65.5, 20.5, 52.0);
    pub const US_SOUTHEAST: GeoBBox = GeoBBox::new(-98.0, -74.0, 23.0, 40.0);
    pub const US_SOUTHCTRL: GeoBBox = GeoBBox::new(-110.0, -88.0, 24.5, 41.0);
    pub const US_SOUTHWEST: GeoBBox = GeoBBox::new(-128.0, -103.0, 28.5, 42.5);
    pub const US_NORTHWEST: GeoBBox = GeoBBox::new(-130.0, -105.0, 39.0, 52.0);
    pub const US_NORTHCTRL: GeoBBox = GeoBBox::new(-110.0, -85.5, 38.0, 52.0);
    pub const US_NORTHEAST: GeoBBox = GeoBBox::new(-90.0, -65.0, 36.0, 52.0);
    pub const SOUTHERN_PLAINS: GeoBBox = GeoBBox::new(-107.5, -91.0, 27.5, 39.5);
    pub const CENTRAL_PLAINS: GeoBBox = GeoBBox::new(-107.5, -91.0, 33.5, 44.0);
    pub const NORTHERN_PLAINS: GeoBBox = GeoBBox::new(-108.5, -90.0, 41.0, 51.5);
    pub const DIXIE: GeoBBox = GeoBBox::new(-97.0, -79.0, 28.0, 37.5);
    pub const MIDWEST: GeoBBox = GeoBBox::new(-98.0, -79.0, 36.0, 50.0);
    pub const GULF_OF_MEXICO: GeoBBox = GeoBBox::new(-100.0, -79.0, 17.5, 33.0);
    pub const FLORIDA: GeoBBox = GeoBBox::new(-90.0, -77.5, 23.0, 32.5);
    pub const CAROLINAS: GeoBBox = GeoBBox::new(-86.0, -73.0, 31.0, 38.0);
    pub const NORTHEAST_MEGALOPOLIS: GeoBBox = GeoBBox::new(-80.5, -68.0, 37.0, 44.5);
    pub const CALIFORNIA: GeoBBox = GeoBBox::new(-127.5, -112.0, 30.0, 43.0);

    /// Lookup by name, e.g. `"conus"` or `"southern_plains"`.
    pub fn by_name(name: &str) -> Option<GeoBBox> {
        let extent = match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "conus" => CONUS,
            "us_southeast" => US_SOUTHEAST,
            "us_southctrl" => US_SOUTHCTRL,
            "us_southwest" => US_SOUTHWEST,
            "us_northwest" => US_NORTHWEST,
            "us_northctrl" => US_NORTHCTRL,
            "us_northeast" => US_NORTHEAST,
            "southern_plains" => SOUTHERN_PLAINS,
            "central_plains" => CENTRAL_PLAINS,
            "northern_plains" => NORTHERN_PLAINS,
            "dixie" => DIXIE,
            "midwest" => MIDWEST,
            "gulf_of_mexico" => GULF_OF_MEXICO,
            "florida" => FLORIDA,
            "carolinas" => CAROLINAS,
            "northeast_megalopolis" => NORTHEAST_MEGALOPOLIS,
            "california" => CALIFORNIA,
            _ => return None,
        };
        Some(extent)
    }
}
