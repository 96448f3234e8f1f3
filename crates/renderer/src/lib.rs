//! Raster map rendering for satellite and radar products.
//!
//! A [`Mapper`] fixes the projection, extent and basemap style; a
//! [`Viewport`] ties its projected bounds to a pixel grid. Imagery is drawn
//! by inverse-mapping every canvas pixel into the product, basemap layers are
//! stroked from shapefiles on top, and the result is written as PNG.

pub mod canvas;
pub mod imagery;
pub mod legend;
pub mod mapper;
pub mod plot;
pub mod png;
pub mod products;

pub use canvas::Canvas;
pub use imagery::{draw_radar, draw_satellite, satellite_mapping, ValueMapping};
pub use legend::{bottom_right_stamp, colorbar_inset, load_font, range_ring, ring_extent, DEFAULT_RANGE_MI};
pub use mapper::{LayerProperties, MapLayer, Mapper, Viewport};
pub use plot::{plot_radar, plot_satellite, PlotOptions};
pub use png::{encode_png, save_png};
pub use rusttype::Font;
