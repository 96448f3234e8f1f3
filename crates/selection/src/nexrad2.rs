//! NEXRAD Level II volume scans from a radar server.

use std::sync::Arc;

use thredds::{CatalogFetcher, RadarServer};
use wx_common::{RadarServerConfig, WxError, WxResult};

use crate::radar::RadarSelection;
use crate::timestamp::TimestampPattern;

pub type Nexrad2Selection = RadarSelection<Arc<RadarServer>>;

/// A radar site known to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarStation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl RadarStation {
    pub fn new(server: &RadarServer, id: &str) -> WxResult<Self> {
        let id = id.to_uppercase();
        let station = server
            .stations()
            .get(&id)
            .ok_or_else(|| WxError::access(format!("Invalid station: {}", id)))?;
        Ok(Self {
            id,
            name: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            elevation: station.elevation,
        })
    }

    /// `(lat, lon)` of the antenna.
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Connect to the Level II collection named in `config`.
pub async fn level2_server(fetcher: Arc<dyn CatalogFetcher>, config: &RadarServerConfig) -> WxResult<RadarServer> {
    RadarServer::from_host(fetcher, &config.host, &config.dataset).await
}

/// Selection of the scans of `station`.
pub fn nexrad2(server: Arc<RadarServer>, station: &str) -> WxResult<Nexrad2Selection> {
    RadarSelection::new(server, station, TimestampPattern::Nexrad2)
}
