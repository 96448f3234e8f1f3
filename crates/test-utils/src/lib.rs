//! Shared test utilities for the wxplot workspace.
//!
//! - In-memory catalog fetchers standing in for a THREDDS server
//! - Catalog, station list and palette fixtures
//! - Test data path helpers and skip macros
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fetcher;
pub mod fixtures;
pub mod paths;

pub use fetcher::*;
pub use fixtures::*;
pub use paths::*;

/// Path of an optional data file, or return early from the test when it is
/// absent (decoder tests need real NetCDF granules).
///
/// ```ignore
/// let path = require_test_file!("Level2_KMUX_20170715_2333.ar2v.nc");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        let Some(path) = $crate::find_test_file($name) else {
            eprintln!("skipping: {} not available (set TEST_DATA_DIR)", $name);
            return;
        };
        path
    }};
}

/// `|left - right| <= epsilon`, compared as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "approx assertion failed: {} vs {} (epsilon {})",
            left,
            right,
            epsilon
        );
    }};
}

/// Component-wise [`assert_approx_eq!`] on coordinate pairs.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_epsilon() {
        assert_approx_eq!(6370.9971, 6370.997, 0.001);
        assert_coords_approx_eq!((-121.9001, 37.1601), (-121.9, 37.16), 0.001);
    }

    #[test]
    #[should_panic(expected = "approx assertion failed")]
    fn test_approx_outside_epsilon() {
        assert_approx_eq!(273.25, 273.15, 0.01);
    }

    #[test]
    fn test_require_missing_file_returns_early() {
        fn run() {
            let _path = require_test_file!("definitely-not-a-granule.nc");
            panic!("should have returned");
        }
        run();
    }
}
