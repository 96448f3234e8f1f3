//! Decode one dataset and write its plot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colortables::{Colortable, PaletteRepos, Rgba as Color};
use netcdf_parser::{load_gini, load_scmi, Level2Volume, RadarType};
use renderer::legend::{range_ring, ring_extent};
use renderer::products::{
    gini_colortable, gini_map, goes16_colortable, goes16_map, goes16_scale, radar_colortable, radar_map,
    resolve_colortable,
};
use renderer::{plot_radar, plot_satellite, save_png, Font, PlotOptions};
use tracing::info;
use wx_common::{GeoBBox, WxConfig};

/// Everything shared by the plots of one run.
pub struct PlotContext {
    pub config: WxConfig,
    pub repos: PaletteRepos,
    pub font: Option<Font<'static>>,
    pub out_dir: PathBuf,
    pub width: u32,
    pub colorbar: bool,
    pub colortable: Option<String>,
}

impl PlotContext {
    fn options(&self, stamp: String) -> PlotOptions<'_> {
        PlotOptions {
            width: self.width,
            colorbar: self.colorbar,
            stamp: Some(stamp),
            font: self.font.as_ref(),
            ..Default::default()
        }
    }

    fn colortable(&self, default: Option<&str>) -> Result<Arc<Colortable>> {
        resolve_colortable(&self.repos, self.colortable.as_deref(), default)?
            .context("No colortable given and the product has no default")
    }

    /// `<out_dir>/<group>/<dataset stem>.png`
    pub fn output_path(&self, group: &str, dataset: &str) -> PathBuf {
        let stem = Path::new(dataset)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dataset.to_string());
        self.out_dir.join(group).join(format!("{}.png", stem))
    }
}

fn stamp_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%MZ").to_string()
}

pub struct Goes16Job<'a> {
    pub url: &'a str,
    pub output: PathBuf,
    pub extent: Option<GeoBBox>,
}

pub fn goes16(ctx: &PlotContext, job: Goes16Job<'_>) -> Result<PathBuf> {
    let scan = load_scmi(job.url).with_context(|| format!("Failed to open {}", job.url))?;
    let sattype = scan.sattype()?;
    let grid = scan.read_grid(true)?;

    let mut mapper = goes16_map(&scan, &ctx.config.shapefile_dir)?;
    if let Some(extent) = job.extent {
        mapper.set_extent(extent);
    }
    let table = ctx.colortable(Some(goes16_colortable(sattype)))?;
    let stamp = format!("GOES-16 CH{:02} {}", scan.channel, stamp_time(&scan.timestamp));
    let options = PlotOptions {
        scale: goes16_scale(sattype),
        ..ctx.options(stamp)
    };
    let canvas = plot_satellite(&mapper, &grid, &table, &options)?;
    save_png(&canvas, &job.output)?;
    info!(path = %job.output.display(), "Saved GOES-16 plot");
    Ok(job.output)
}

pub fn goes_legacy(ctx: &PlotContext, url: &str, output: PathBuf, extent: Option<GeoBBox>) -> Result<PathBuf> {
    let grid = load_gini(url).with_context(|| format!("Failed to open {}", url))?;
    let mut mapper = gini_map(grid.projection.clone(), &ctx.config.shapefile_dir);
    if let Some(extent) = extent {
        mapper.set_extent(extent);
    }
    let table = ctx.colortable(Some(gini_colortable(grid.sattype)))?;
    let stamp = format!("GOES {} {}", grid.sattype, stamp_time(&grid.timestamp));
    let canvas = plot_satellite(&mapper, &grid, &table, &ctx.options(stamp))?;
    save_png(&canvas, &output)?;
    info!(path = %output.display(), "Saved GOES legacy plot");
    Ok(output)
}

pub struct RadarJob<'a> {
    pub url: &'a str,
    pub output: PathBuf,
    pub moment: RadarType,
    pub hires: bool,
    pub sweep: usize,
    pub ring_miles: Option<f64>,
    pub extent: Option<GeoBBox>,
}

pub fn radar(ctx: &PlotContext, job: RadarJob<'_>) -> Result<PathBuf> {
    let volume = Level2Volume::open(job.url).with_context(|| format!("Failed to open {}", job.url))?;
    let sweep = volume.sweep(job.moment, job.hires, job.sweep)?;
    let station = volume.station_location();

    let extent = match (job.extent, job.ring_miles) {
        (Some(extent), _) => extent,
        (None, Some(miles)) => ring_extent(station, miles)?,
        (None, None) => volume.extent(),
    };
    let mapper = radar_map(station, extent, &ctx.config.shapefile_dir)?;
    let table = ctx.colortable(radar_colortable(job.moment))?;
    let stamp = format!("{} {} {}", volume.station(), job.moment, stamp_time(&sweep.timestamp));
    let options = PlotOptions {
        clip_miles: job.ring_miles,
        ..ctx.options(stamp)
    };
    let mut canvas = plot_radar(&mapper, &sweep, &table, &options)?;
    if let Some(miles) = job.ring_miles {
        let viewport = mapper.viewport(options.width, None)?;
        range_ring(&mut canvas, &mapper, &viewport, station, Some(miles), Color::rgb(255, 255, 255), 1.0)?;
    }
    save_png(&canvas, &job.output)?;
    info!(path = %job.output.display(), "Saved radar plot");
    Ok(job.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(out_dir: &Path) -> PlotContext {
        PlotContext {
            config: WxConfig::default(),
            repos: PaletteRepos::new("/nonexistent"),
            font: None,
            out_dir: out_dir.to_path_buf(),
            width: 100,
            colorbar: true,
            colortable: None,
        }
    }

    #[test]
    fn test_output_path_uses_dataset_stem() {
        let ctx = context(Path::new("/plots"));
        assert_eq!(
            ctx.output_path("radar/KMUX", "Level2_KMUX_20170715_2333.ar2v"),
            PathBuf::from("/plots/radar/KMUX/Level2_KMUX_20170715_2333.png")
        );
        assert_eq!(
            ctx.output_path("goes16", "GOES16_20170618_004719_0.64_500m_33.3N_91.4W.nc4"),
            PathBuf::from("/plots/goes16/GOES16_20170618_004719_0.64_500m_33.3N_91.4W.png")
        );
    }

    #[test]
    fn test_missing_default_colortable_is_error() {
        let ctx = context(Path::new("/plots"));
        assert!(ctx.colortable(None).is_err());
    }

    #[test]
    fn test_stamp_time() {
        let ts = chrono::TimeZone::with_ymd_and_hms(&Utc, 2017, 7, 15, 23, 33, 0).unwrap();
        assert_eq!(stamp_time(&ts), "2017-07-15 23:33Z");
    }
}
