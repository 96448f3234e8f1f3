//! Great-circle and extent helper tests.

use wx_common::geo::{self, extents, GeoBBox};
use wx_common::units;

fn assert_close(actual: f64, expected: f64, delta: f64) {
    assert!(
        (actual - expected).abs() <= delta,
        "{} != {} (delta {})",
        actual,
        expected,
        delta
    );
}

#[test]
fn test_destination_point() {
    let (lon2, lat2) = geo::destination_point(-73.984, 40.76, 88.8561, 45.0, units::KILOMETER).unwrap();
    assert_close(lat2, 41.3224612, 0.01);
    assert_close(lon2, -73.2318226, 0.01);
}

#[test]
fn test_destination_point_in_miles() {
    let (lon_km, lat_km) = geo::destination_point(-97.0, 35.0, 160.9344, 30.0, units::KILOMETER).unwrap();
    let (lon_mi, lat_mi) = geo::destination_point(-97.0, 35.0, 100.0, 30.0, units::MILE).unwrap();
    assert_close(lon_km, lon_mi, 1e-9);
    assert_close(lat_km, lat_mi, 1e-9);
}

#[test]
fn test_bbox_from_coords() {
    let bbox = GeoBBox::from_coords(vec![(-1.0, -5.0), (2.0, 3.0), (5.0, 0.0)]).unwrap();
    assert_eq!(bbox, GeoBBox::new(-1.0, 5.0, -5.0, 3.0));
}

#[test]
fn test_bbox_from_center_and_range() {
    // Miami, FL
    let bbox = GeoBBox::from_center_and_range((25.76, -80.19), 300.0, units::KILOMETER).unwrap();
    assert_close(bbox.west, -83.18, 0.01);
    assert_close(bbox.east, -77.20, 0.01);
    assert_close(bbox.south, 23.06, 0.01);
    assert_close(bbox.north, 28.46, 0.01);
}

#[test]
fn test_zoom_matches_center_and_range() {
    let zoomed = geo::zoom((25.76, -80.19), 300.0).unwrap();
    let direct = GeoBBox::from_center_and_range((25.76, -80.19), 300.0, units::KILOMETER).unwrap();
    assert_eq!(zoomed, direct);
}

#[test]
fn test_relative_percentage() {
    assert_close(geo::relative_percentage(50.0, 25.0, 100.0), 0.333, 0.001);
}

#[test]
fn test_named_extents() {
    assert_eq!(extents::CONUS, GeoBBox::new(-127.5, -65.5, 20.5, 52.0));
    assert_eq!(extents::by_name("florida"), Some(extents::FLORIDA));
}
