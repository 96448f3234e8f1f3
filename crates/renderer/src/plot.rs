//! Full plots: map, imagery, basemap layers and decorations on one canvas.

use colortables::Colortable;
use netcdf_parser::{RadarSweep, SatelliteGrid};
use rusttype::Font;
use tracing::info;
use wx_common::units::MILE;
use wx_common::{Scale, WxResult};

use crate::canvas::Canvas;
use crate::imagery::{draw_radar, draw_satellite, grid_bounds, satellite_mapping};
use crate::legend::{bottom_right_stamp, colorbar_inset};
use crate::mapper::Mapper;

pub const DEFAULT_WIDTH: u32 = 1200;

/// Options shared by every plot.
pub struct PlotOptions<'f> {
    pub width: u32,
    pub colorbar: bool,
    pub stamp: Option<String>,
    pub font: Option<&'f Font<'static>>,
    /// Explicit data range for brightness-scale colortables.
    pub scale: Option<Scale>,
    /// Radar gates beyond this many miles from the station are not drawn.
    pub clip_miles: Option<f64>,
}

impl Default for PlotOptions<'_> {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            colorbar: true,
            stamp: None,
            font: None,
            scale: None,
            clip_miles: None,
        }
    }
}

fn decorate(canvas: &mut Canvas, table: &Colortable, options: &PlotOptions<'_>) {
    if options.colorbar {
        colorbar_inset(canvas, table, options.font);
    }
    if let Some(text) = &options.stamp {
        let size = (canvas.height() as f32 * 0.025).max(10.0);
        bottom_right_stamp(canvas, text, options.font, size);
    }
}

/// Satellite frame under the basemap layers. Without a map extent the
/// frame's own bounds are shown.
pub fn plot_satellite(
    mapper: &Mapper,
    grid: &SatelliteGrid,
    table: &Colortable,
    options: &PlotOptions<'_>,
) -> WxResult<Canvas> {
    let fallback = (mapper.projection == grid.projection).then(|| grid_bounds(grid));
    let viewport = mapper.viewport(options.width, fallback)?;
    let mut canvas = mapper.new_canvas(&viewport);

    let mapping = satellite_mapping(grid, table, options.scale)?;
    draw_satellite(&mut canvas, mapper, &viewport, grid, table, mapping)?;
    mapper.draw_layers(&mut canvas, &viewport)?;
    decorate(&mut canvas, table, options);
    info!(
        sattype = %grid.sattype,
        timestamp = %grid.timestamp,
        colortable = table.name(),
        "Finished satellite plot"
    );
    Ok(canvas)
}

/// Radar sweep under the basemap layers.
pub fn plot_radar(
    mapper: &Mapper,
    sweep: &RadarSweep,
    table: &Colortable,
    options: &PlotOptions<'_>,
) -> WxResult<Canvas> {
    let viewport = mapper.viewport(options.width, None)?;
    let mut canvas = mapper.new_canvas(&viewport);

    let clip_km = options
        .clip_miles
        .map(|mi| MILE.convert(mi, &wx_common::units::KILOMETER))
        .transpose()?;
    draw_radar(&mut canvas, mapper, &viewport, sweep, table, clip_km)?;
    mapper.draw_layers(&mut canvas, &viewport)?;
    decorate(&mut canvas, table, options);
    info!(
        station = %sweep.station,
        radar_type = %sweep.radar_type,
        timestamp = %sweep.timestamp,
        "Finished radar plot"
    );
    Ok(canvas)
}
