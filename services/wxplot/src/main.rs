//! wxplot: fetch, decode and plot GOES satellite and NEXRAD radar data.
//!
//! Datasets are picked from remote THREDDS catalogs (or a radar server),
//! opened over OPeNDAP, rendered onto a map and written as PNG files under
//! the output directory.

mod cli;
mod render;
mod select;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colortables::PaletteRepos;
use netcdf_parser::silence_hdf5_errors;
use renderer::load_font;
use selection::{
    level2_server, nexrad2, DayPartitionedSelection, Goes16Source, GoesLegacySource, RadarStation, TimedDataset,
};
use thredds::{CatalogFetcher, HttpCatalogFetcher};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wx_common::WxConfig;

use cli::{Cli, Product};
use render::{Goes16Job, PlotContext, RadarJob};

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Render every dataset on a blocking thread, one at a time. Failures are
/// logged and counted rather than aborting the rest of the batch.
async fn render_all<F>(ctx: &Arc<PlotContext>, datasets: Vec<TimedDataset>, render: F) -> Result<()>
where
    F: Fn(&PlotContext, &TimedDataset) -> Result<PathBuf> + Send + Sync + Copy + 'static,
{
    if datasets.is_empty() {
        warn!("No datasets matched the query");
        return Ok(());
    }
    let total = datasets.len();
    let mut failed = 0;
    for dataset in datasets {
        let ctx = Arc::clone(ctx);
        let name = dataset.name().to_string();
        let outcome = tokio::task::spawn_blocking(move || render(&ctx, &dataset))
            .await
            .context("Render task panicked")?;
        if let Err(e) = outcome {
            error!(dataset = %name, error = %format!("{:#}", e), "Failed to plot dataset");
            failed += 1;
        }
    }
    info!(total = total, failed = failed, "Finished plotting");
    if failed > 0 {
        bail!("{} of {} datasets failed to plot", failed, total);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let config = WxConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    info!(
        palettes = %config.palettes_dir.display(),
        shapefiles = %config.shapefile_dir.display(),
        out_dir = %cli.out_dir.display(),
        "Starting wxplot"
    );
    silence_hdf5_errors();

    let fetcher: Arc<dyn CatalogFetcher> =
        Arc::new(HttpCatalogFetcher::new(Duration::from_secs(config.http_timeout_secs))?);
    let font = load_font(config.font.as_deref()).context("Failed to load font")?;
    let ctx = Arc::new(PlotContext {
        repos: PaletteRepos::new(&config.palettes_dir),
        font,
        out_dir: cli.out_dir.clone(),
        width: cli.width,
        colorbar: !cli.no_colorbar,
        colortable: cli.colortable.clone(),
        config,
    });

    match cli.product {
        Product::Goes16 {
            sector,
            channel,
            view,
            when,
        } => {
            let query = when.parse()?;
            let extent = view.extent()?;
            let source = Goes16Source::new(fetcher, &ctx.config.goes16_base, sector, channel)?;
            let selection = DayPartitionedSelection::new(source);
            let datasets = select::day_partitioned(&selection, &query).await?;
            info!(sector = %sector, channel = channel, count = datasets.len(), "Selected GOES-16 scans");

            render_all(&ctx, datasets, move |ctx, ds| {
                let output = ctx.output_path(&group_for(ds, "goes16"), ds.name());
                let url = ds.opendap_url()?;
                render::goes16(ctx, Goes16Job { url, output, extent })
            })
            .await
        }
        Product::GoesLegacy {
            sattype,
            west,
            view,
            when,
        } => {
            let query = when.parse()?;
            let extent = view.extent()?;
            let base = ctx.config.thredds_base.clone();
            let source = if west {
                GoesLegacySource::conus_west(fetcher, &base, &sattype)?
            } else {
                GoesLegacySource::conus_east(fetcher, &base, &sattype)?
            };
            let selection = DayPartitionedSelection::new(source);
            let datasets = select::day_partitioned(&selection, &query).await?;
            info!(sattype = %sattype, count = datasets.len(), "Selected GOES legacy frames");

            render_all(&ctx, datasets, move |ctx, ds| {
                let output = ctx.output_path(&group_for(ds, "goes-legacy"), ds.name());
                render::goes_legacy(ctx, ds.opendap_url()?, output, extent)
            })
            .await
        }
        Product::Radar {
            station,
            moment,
            hires,
            sweep,
            ring,
            view,
            when,
        } => {
            let query = when.parse()?;
            let extent = view.extent()?;
            let server = Arc::new(
                level2_server(fetcher, &ctx.config.radar)
                    .await
                    .context("Failed to connect to radar server")?,
            );
            let site = RadarStation::new(&server, &station)?;
            info!(station = %site.id, name = %site.name, location = ?site.location(), "Radar station");
            let selection = nexrad2(server, &site.id)?;
            let datasets = select::radar(&selection, &query).await?;

            render_all(&ctx, datasets, move |ctx, ds| {
                let output = ctx.output_path(&group_for(ds, "radar"), ds.name());
                render::radar(
                    ctx,
                    RadarJob {
                        url: ds.opendap_url()?,
                        output,
                        moment,
                        hires,
                        sweep,
                        ring_miles: ring,
                        extent,
                    },
                )
            })
            .await
        }
    }
}

/// Output sub-directory: product family then UTC day.
fn group_for(ds: &TimedDataset, product: &str) -> String {
    format!("{}/{}", product, ds.timestamp.format("%Y%m%d"))
}
