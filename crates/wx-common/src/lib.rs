//! Common types and utilities shared across the wxplot crates.

pub mod config;
pub mod error;
pub mod geo;
pub mod time;
pub mod units;

pub use config::{RadarServerConfig, WxConfig};
pub use error::{WxError, WxResult};
pub use geo::GeoBBox;
pub use time::{Clock, FixedClock, SortOrder, SystemClock, TimeRange};
pub use units::{Dimension, NamedUnit, Scale, Unit};
