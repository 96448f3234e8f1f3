//! Selection over a radar server, where time filtering happens server side.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thredds::{Catalog, RadarQuery, RadarServer};
use tracing::{debug, info};
use wx_common::{Clock, SortOrder, SystemClock, WxError, WxResult};

use crate::dataset::{sorted_datasets, Resolved, TimedDataset};
use crate::index::{position, slice_positions, DatasetIndex, SliceKind, Step};
use crate::timestamp::TimestampPattern;

/// Temporal part of a radar query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarTimeQuery {
    /// `temporal=all`
    All,
    /// `time=`: the scan nearest to the given time.
    Nearest(DateTime<Utc>),
    /// `time_start=` / `time_end=`
    Range(DateTime<Utc>, DateTime<Utc>),
}

impl RadarTimeQuery {
    pub fn apply(&self, query: RadarQuery) -> RadarQuery {
        match *self {
            RadarTimeQuery::All => query.all_times(),
            RadarTimeQuery::Nearest(t) => query.time(t),
            RadarTimeQuery::Range(start, end) => query.time_range(start, end),
        }
    }
}

/// Anything that answers radar queries with catalogs.
#[async_trait]
pub trait RadarCatalogSource: Send + Sync {
    fn query(&self) -> RadarQuery {
        RadarQuery::new()
    }

    fn validate_query(&self, query: &RadarQuery) -> bool;

    async fn get_catalog(&self, query: &RadarQuery) -> WxResult<Catalog>;
}

#[async_trait]
impl RadarCatalogSource for RadarServer {
    fn query(&self) -> RadarQuery {
        RadarServer::query(self)
    }

    fn validate_query(&self, query: &RadarQuery) -> bool {
        RadarServer::validate_query(self, query)
    }

    async fn get_catalog(&self, query: &RadarQuery) -> WxResult<Catalog> {
        RadarServer::get_catalog(self, query).await
    }
}

#[async_trait]
impl<T: RadarCatalogSource + ?Sized> RadarCatalogSource for Arc<T> {
    fn query(&self) -> RadarQuery {
        (**self).query()
    }

    fn validate_query(&self, query: &RadarQuery) -> bool {
        (**self).validate_query(query)
    }

    async fn get_catalog(&self, query: &RadarQuery) -> WxResult<Catalog> {
        (**self).get_catalog(query).await
    }
}

/// Datasets of one radar station.
pub struct RadarSelection<S> {
    source: S,
    station: String,
    pattern: TimestampPattern,
    clock: Arc<dyn Clock>,
}

impl<S: RadarCatalogSource> RadarSelection<S> {
    pub fn new(source: S, station: &str, pattern: TimestampPattern) -> WxResult<Self> {
        Self::with_clock(source, station, pattern, Arc::new(SystemClock))
    }

    /// Fails with `DatasetAccess` when the server does not know `station`.
    pub fn with_clock(
        source: S,
        station: &str,
        pattern: TimestampPattern,
        clock: Arc<dyn Clock>,
    ) -> WxResult<Self> {
        let station = station.to_uppercase();
        let probe = source.query().stations(&[&station]).all_times();
        if !source.validate_query(&probe) {
            return Err(WxError::access(format!("Invalid station: {}", station)));
        }
        Ok(Self {
            source,
            station,
            pattern,
            clock,
        })
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one query; a catalog that cannot be fetched counts as empty.
    pub async fn datasets(&self, time: RadarTimeQuery, order: SortOrder) -> WxResult<Vec<TimedDataset>> {
        let query = time.apply(self.source.query().stations(&[&self.station]));
        match self.source.get_catalog(&query).await {
            Ok(catalog) => Ok(sorted_datasets(catalog, self.pattern, order)),
            Err(e) if e.is_missing_catalog() => {
                debug!(station = %self.station, query = %query, error = %e, "Radar query found no catalog");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Newest scan the server holds.
    pub async fn latest(&self) -> WxResult<TimedDataset> {
        let found = self
            .datasets(RadarTimeQuery::All, SortOrder::Desc)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WxError::access(format!("No radar datasets found for {}", self.station)))?;
        info!(station = %self.station, dataset = %found.name(), "Selected latest radar scan");
        Ok(found)
    }

    /// Scan the server considers nearest to `when`.
    pub async fn around(&self, when: DateTime<Utc>) -> WxResult<TimedDataset> {
        self.datasets(RadarTimeQuery::Nearest(when), SortOrder::Asc)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WxError::access(format!("No dataset found around {}", when)))
    }

    pub async fn between(
        &self,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
        order: SortOrder,
    ) -> WxResult<Vec<TimedDataset>> {
        if t1 >= t2 {
            return Err(WxError::invalid("t1 must be less than t2"));
        }
        self.datasets(RadarTimeQuery::Range(t1, t2), order).await
    }

    pub async fn since(&self, when: DateTime<Utc>, order: SortOrder) -> WxResult<Vec<TimedDataset>> {
        self.between(when, self.clock.now(), order).await
    }

    pub async fn contains(&self, timestamp: DateTime<Utc>) -> WxResult<bool> {
        Ok(self
            .datasets(RadarTimeQuery::Nearest(timestamp), SortOrder::Asc)
            .await?
            .iter()
            .any(|ds| ds.timestamp == timestamp))
    }

    pub async fn get(&self, index: impl Into<DatasetIndex>) -> WxResult<Resolved> {
        match index.into() {
            DatasetIndex::Position(i) => {
                let all = self.datasets(RadarTimeQuery::All, SortOrder::Asc).await?;
                let pos = position(all.len(), i)
                    .ok_or_else(|| WxError::access(format!("No dataset found for index: {}", i)))?;
                Ok(Resolved::One(all[pos].clone()))
            }
            DatasetIndex::Timestamp(ts) => self
                .datasets(RadarTimeQuery::Nearest(ts), SortOrder::Asc)
                .await?
                .into_iter()
                .next()
                .map(Resolved::One)
                .ok_or_else(|| WxError::access(format!("No dataset found for timestamp: {}", ts))),
            DatasetIndex::Slice(slice) => match slice.classify()? {
                SliceKind::Index { start, stop, stride } => {
                    let all = self.datasets(RadarTimeQuery::All, SortOrder::Asc).await?;
                    Ok(Resolved::Many(
                        slice_positions(all.len(), start, stop, stride)
                            .into_iter()
                            .map(|p| all[p].clone())
                            .collect(),
                    ))
                }
                SliceKind::Time { start, stop, step } => {
                    let start = start.ok_or_else(|| WxError::invalid("Must provide a start time for slice"))?;
                    let stop = stop.unwrap_or_else(|| self.clock.now());
                    self.time_slice(start, stop, step).await.map(Resolved::Many)
                }
            },
        }
    }

    async fn time_slice(
        &self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step: Option<Step>,
    ) -> WxResult<Vec<TimedDataset>> {
        if start >= stop {
            return Ok(Vec::new());
        }
        match step {
            None => self.datasets(RadarTimeQuery::Range(start, stop), SortOrder::Asc).await,
            Some(Step::Stride(n)) => Ok(self
                .datasets(RadarTimeQuery::Range(start, stop), SortOrder::Asc)
                .await?
                .into_iter()
                .step_by(n.max(1))
                .collect()),
            Some(Step::Every(delta)) => {
                // One scan per tick; neighbouring ticks may resolve to the same scan.
                let mut found = Vec::new();
                let mut tick = start;
                while tick <= stop {
                    let nearest = self
                        .datasets(RadarTimeQuery::Nearest(tick), SortOrder::Asc)
                        .await?
                        .into_iter()
                        .next();
                    match nearest {
                        Some(ds) => found.push(ds),
                        None => debug!(station = %self.station, %tick, "No scan for tick"),
                    }
                    tick += delta;
                }
                Ok(found)
            }
        }
    }
}
