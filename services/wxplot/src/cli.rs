//! Command line definition.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use netcdf_parser::RadarType;
use selection::Goes16Sector;
use wx_common::geo::{extents, zoom};
use wx_common::time::{parse_datetime, parse_duration};
use wx_common::GeoBBox;

#[derive(Parser, Debug)]
#[command(name = "wxplot")]
#[command(about = "Fetch, decode and plot GOES satellite and NEXRAD radar data")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "WXPLOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (e.g. `debug`, `selection=trace`)
    #[arg(long, env = "WXPLOT_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Directory receiving the PNG files
    #[arg(long, env = "WXPLOT_OUT_DIR", default_value = "plots")]
    pub out_dir: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = renderer::plot::DEFAULT_WIDTH)]
    pub width: u32,

    /// Colortable as `group.label` (e.g. `ir.rainbow`); defaults per product
    #[arg(long)]
    pub colortable: Option<String>,

    /// Leave out the colorbar inset
    #[arg(long)]
    pub no_colorbar: bool,

    #[command(subcommand)]
    pub product: Product,
}

#[derive(Subcommand, Debug)]
pub enum Product {
    /// GOES-16 ABI sectorized cloud and moisture imagery
    Goes16 {
        /// conus, meso1, meso2, fulldisk or puertorico
        #[arg(long, default_value = "conus")]
        sector: Goes16Sector,

        /// ABI channel, 1-16
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=16))]
        channel: u8,

        #[command(flatten)]
        view: ViewArgs,

        #[command(subcommand)]
        when: When,
    },
    /// Legacy GOES-East/West GINI imagery
    GoesLegacy {
        /// VIS, IR or WV
        #[arg(long, default_value = "IR")]
        sattype: String,

        /// Use the GOES-West sector
        #[arg(long)]
        west: bool,

        #[command(flatten)]
        view: ViewArgs,

        #[command(subcommand)]
        when: When,
    },
    /// NEXRAD Level II volume scans
    Radar {
        /// Four letter station id
        #[arg(long)]
        station: String,

        /// Radar moment (Reflectivity, RadialVelocity, ...)
        #[arg(long, default_value = "Reflectivity")]
        moment: RadarType,

        /// Use the super-resolution moment
        #[arg(long)]
        hires: bool,

        /// Sweep (elevation) index
        #[arg(long, default_value_t = 0)]
        sweep: usize,

        /// Draw a range ring and fit the map to it, in miles
        #[arg(long)]
        ring: Option<f64>,

        #[command(flatten)]
        view: ViewArgs,

        #[command(subcommand)]
        when: When,
    },
}

/// Map extent overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Named extent (conus, florida, midwest, ...)
    #[arg(long, conflicts_with = "zoom")]
    pub extent: Option<String>,

    /// `LAT,LON,KM` box around a point
    #[arg(long)]
    pub zoom: Option<String>,
}

impl ViewArgs {
    pub fn extent(&self) -> Result<Option<GeoBBox>> {
        if let Some(name) = &self.extent {
            return extents::by_name(name)
                .map(Some)
                .with_context(|| format!("Unknown extent: {}", name));
        }
        let Some(spec) = &self.zoom else {
            return Ok(None);
        };
        let parts = spec
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid zoom: {}", spec))?;
        match parts.as_slice() {
            [lat, lon, km] => Ok(Some(zoom((*lat, *lon), *km)?)),
            _ => bail!("Zoom must be LAT,LON,KM, got {}", spec),
        }
    }
}

/// Which datasets to plot.
#[derive(Subcommand, Debug, Clone)]
pub enum When {
    /// Most recent dataset
    Latest {
        /// Look back this far (e.g. `30m`, `2h`)
        #[arg(long)]
        within: Option<String>,
    },
    /// Dataset closest to a time
    Around {
        time: String,
        #[arg(long)]
        within: Option<String>,
    },
    /// Every dataset in `[start, end)`
    Between { start: String, end: String },
    /// Every dataset from a time until now
    Since { start: String },
}

/// Parsed form of [`When`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeQuery {
    Latest(Option<Duration>),
    Around(DateTime<Utc>, Option<Duration>),
    Between(DateTime<Utc>, DateTime<Utc>),
    Since(DateTime<Utc>),
}

fn duration(value: &Option<String>) -> Result<Option<Duration>> {
    value
        .as_deref()
        .map(|v| parse_duration(v).with_context(|| format!("Invalid duration: {}", v)))
        .transpose()
}

fn datetime(value: &str) -> Result<DateTime<Utc>> {
    parse_datetime(value).with_context(|| format!("Invalid time: {}", value))
}

impl When {
    pub fn parse(&self) -> Result<TimeQuery> {
        Ok(match self {
            When::Latest { within } => TimeQuery::Latest(duration(within)?),
            When::Around { time, within } => TimeQuery::Around(datetime(time)?, duration(within)?),
            When::Between { start, end } => {
                let (start, end) = (datetime(start)?, datetime(end)?);
                if start >= end {
                    bail!("Start {} must be before end {}", start, end);
                }
                TimeQuery::Between(start, end)
            }
            When::Since { start } => TimeQuery::Since(datetime(start)?),
        })
    }
}
