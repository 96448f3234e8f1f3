//! Runtime configuration: defaults, optional YAML file, environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WxError, WxResult};

pub const ENV_PALETTES_DIR: &str = "WXPLOT_PALETTES_DIR";
pub const ENV_SHAPEFILE_DIR: &str = "WXPLOT_SHAPEFILE_DIR";
pub const ENV_FONT: &str = "WXPLOT_FONT";
pub const ENV_THREDDS_BASE: &str = "WXPLOT_THREDDS_BASE";
pub const ENV_RADAR_HOST: &str = "WXPLOT_RADAR_HOST";
pub const ENV_RADAR_DATASET: &str = "WXPLOT_RADAR_DATASET";

/// Radar server location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarServerConfig {
    /// THREDDS host root, e.g. `http://thredds.ucar.edu/thredds/`.
    pub host: String,
    /// Dataset title as listed by the radar server.
    pub dataset: String,
}

impl Default for RadarServerConfig {
    fn default() -> Self {
        Self {
            host: "http://thredds.ucar.edu/thredds/".to_string(),
            dataset: "NEXRAD Level II Radar from IDD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WxConfig {
    /// Directory of `.pal` palette files.
    pub palettes_dir: PathBuf,
    /// Directory of basemap shapefiles.
    pub shapefile_dir: PathBuf,
    /// TrueType font for stamps and colorbar labels.
    pub font: Option<PathBuf>,
    /// Root of the GOES legacy satellite catalogs.
    pub thredds_base: String,
    /// Root of the GOES-16 catalogs.
    pub goes16_base: String,
    pub radar: RadarServerConfig,
    /// Timeout for catalog HTTP requests, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for WxConfig {
    fn default() -> Self {
        Self {
            palettes_dir: PathBuf::from("resources/palettes"),
            shapefile_dir: PathBuf::from("resources/shapefiles"),
            font: None,
            thredds_base: "http://thredds.ucar.edu/thredds/catalog/satellite/".to_string(),
            goes16_base: "http://thredds-jumbo.unidata.ucar.edu/thredds/catalog/satellite/goes16/GOES16/"
                .to_string(),
            radar: RadarServerConfig::default(),
            http_timeout_secs: 60,
        }
    }
}

impl WxConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> WxResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            WxError::Config(format!("Failed to read config from {:?}: {}", path.as_ref(), e))
        })?;
        let config: WxConfig = serde_yaml::from_str(&content)?;
        debug!(path = ?path.as_ref(), "Loaded configuration file");
        Ok(config.with_env_overrides())
    }

    /// Defaults (or the given file) plus environment overrides.
    pub fn load(path: Option<&Path>) -> WxResult<Self> {
        match path {
            Some(p) => Self::from_yaml_file(p),
            None => Ok(Self::default().with_env_overrides()),
        }
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PALETTES_DIR) {
            self.palettes_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_SHAPEFILE_DIR) {
            self.shapefile_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_FONT) {
            self.font = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_THREDDS_BASE) {
            self.thredds_base = v;
        }
        if let Some(v) = lookup(ENV_RADAR_HOST) {
            self.radar.host = v;
        }
        if let Some(v) = lookup(ENV_RADAR_DATASET) {
            self.radar.dataset = v;
        }
        self
    }
}
