//! Colortables built from `.pal` palette files.
//!
//! A palette maps boundary values to one or two colors. It is turned into
//! per-channel segment data (a piecewise-linear gradient over `[0, 1]`) and
//! a normalization range; together with a unit they form a [`Colortable`].

pub mod color;
pub mod colormap;
pub mod colortable;
pub mod palette;
pub mod repo;

pub use color::Rgba;
pub use colormap::{Colormap, Normalize, SegmentData, SegmentStop};
pub use colortable::{load_colortable, Colortable};
pub use palette::{Palette, PaletteEntry};
pub use repo::{PaletteRepo, PaletteRepos};
