//! Radar server query protocol.
//!
//! A radar server exposes a catalog of radar collections at
//! `<host>/radarServer/catalog.xml`. Each collection answers
//! `?stn=...&time=...` style queries with a THREDDS catalog of matching
//! volume scans, and lists its stations in `stations.xml`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, instrument};
use wx_common::{WxError, WxResult};

use crate::catalog::{Catalog, CatalogRef};
use crate::client::CatalogFetcher;

const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Query string builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadarQuery {
    params: Vec<(String, String)>,
}

impl RadarQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, key: &str, values: impl IntoIterator<Item = String>) -> Self {
        self.params.retain(|(k, _)| k != key);
        self.params.extend(values.into_iter().map(|v| (key.to_string(), v)));
        self
    }

    fn clear_time(mut self) -> Self {
        self.params
            .retain(|(k, _)| !matches!(k.as_str(), "time" | "time_start" | "time_end" | "temporal"));
        self
    }

    pub fn stations<S: AsRef<str>>(self, stations: &[S]) -> Self {
        self.set("stn", stations.iter().map(|s| s.as_ref().to_uppercase()))
    }

    /// Scan closest to `time`.
    pub fn time(self, time: DateTime<Utc>) -> Self {
        self.clear_time()
            .set("time", [time.format(QUERY_TIME_FORMAT).to_string()])
    }

    /// Scans within `[start, end]`.
    pub fn time_range(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.clear_time()
            .set("time_start", [start.format(QUERY_TIME_FORMAT).to_string()])
            .set("time_end", [end.format(QUERY_TIME_FORMAT).to_string()])
    }

    /// Every scan the server holds.
    pub fn all_times(self) -> Self {
        self.clear_time().set("temporal", ["all".to_string()])
    }

    pub fn station_ids(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == "stn")
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for RadarQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", joined.join("&"))
    }
}

/// Radar site listed in `stations.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// Catalog references of the radar collections available on `host`.
#[instrument(skip(fetcher))]
pub async fn get_radarserver_datasets(
    fetcher: &dyn CatalogFetcher,
    host: &str,
) -> WxResult<BTreeMap<String, CatalogRef>> {
    let url = format!("{}/radarServer/catalog.xml", host.trim_end_matches('/'));
    let catalog = fetcher.fetch_catalog(&url).await?;
    Ok(catalog.catalog_refs)
}

/// One radar collection on a radar server.
pub struct RadarServer {
    base_url: String,
    fetcher: Arc<dyn CatalogFetcher>,
    stations: BTreeMap<String, Station>,
}

impl fmt::Debug for RadarServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadarServer")
            .field("base_url", &self.base_url)
            .field("stations", &self.stations.len())
            .finish()
    }
}

impl RadarServer {
    /// Connect to the collection at `url` (a `dataset.xml`/`catalog.xml`
    /// document or the collection root) and load its station list.
    pub async fn connect(fetcher: Arc<dyn CatalogFetcher>, url: &str) -> WxResult<Self> {
        let base_url = url
            .trim_end_matches("/dataset.xml")
            .trim_end_matches("/catalog.xml")
            .trim_end_matches('/')
            .to_string();

        let stations_url = format!("{}/stations.xml", base_url);
        let xml = fetcher
            .fetch_text(&stations_url)
            .await
            .map_err(|e| WxError::CatalogInit(format!("Failed to load stations from {}: {}", stations_url, e)))?;
        let stations = parse_stations(&xml)?;
        info!(url = %base_url, stations = stations.len(), "Connected to radar server");

        Ok(Self {
            base_url,
            fetcher,
            stations,
        })
    }

    /// Look up `dataset` (by title) on `host` and connect to it.
    pub async fn from_host(fetcher: Arc<dyn CatalogFetcher>, host: &str, dataset: &str) -> WxResult<Self> {
        let datasets = get_radarserver_datasets(fetcher.as_ref(), host).await?;
        let reference = datasets.get(dataset).ok_or_else(|| {
            WxError::invalid(format!("Invalid dataset: {} for host: {}", dataset, host))
        })?;
        let href = reference.href.clone();
        Self::connect(fetcher, &href).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stations(&self) -> &BTreeMap<String, Station> {
        &self.stations
    }

    pub fn query(&self) -> RadarQuery {
        RadarQuery::new()
    }

    /// True when every station named by the query is served here.
    pub fn validate_query(&self, query: &RadarQuery) -> bool {
        query.station_ids().iter().all(|id| self.stations.contains_key(*id))
    }

    #[instrument(skip(self), fields(query = %query))]
    pub async fn get_catalog(&self, query: &RadarQuery) -> WxResult<Catalog> {
        let url = format!("{}?{}", self.base_url, query);
        let catalog = self.fetcher.fetch_catalog(&url).await?;
        debug!(datasets = catalog.datasets.len(), "Radar query returned catalog");
        Ok(catalog)
    }
}

/// Parse a `stations.xml` document.
pub fn parse_stations(xml: &str) -> WxResult<BTreeMap<String, Station>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stations = BTreeMap::new();
    let mut current: Option<Station> = None;
    let mut field: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"station" => {
                    let mut id = String::new();
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"id" {
                            id = String::from_utf8_lossy(&attr.value).into_owned();
                        }
                    }
                    current = Some(Station {
                        id,
                        name: String::new(),
                        latitude: f64::NAN,
                        longitude: f64::NAN,
                        elevation: f64::NAN,
                    });
                }
                other => field = Some(String::from_utf8_lossy(other).into_owned()),
            },
            Ok(Event::Text(t)) => {
                if let (Some(station), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let text = t
                        .unescape()
                        .map_err(|e| WxError::CatalogInit(format!("bad station text: {}", e)))?;
                    let text = text.trim();
                    match name {
                        "name" => station.name = text.to_string(),
                        "latitude" => station.latitude = text.parse().unwrap_or(f64::NAN),
                        "longitude" => station.longitude = text.parse().unwrap_or(f64::NAN),
                        "elevation" => station.elevation = text.parse().unwrap_or(f64::NAN),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"station" {
                    if let Some(station) = current.take() {
                        stations.insert(station.id.clone(), station);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WxError::CatalogInit(format!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(stations)
}
