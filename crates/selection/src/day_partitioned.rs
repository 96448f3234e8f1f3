//! Selection over catalogs partitioned by UTC day.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use thredds::Catalog;
use tracing::{debug, info};
use wx_common::{Clock, SortOrder, SystemClock, TimeRange, WxError, WxResult};

use crate::dataset::{sorted_datasets, Resolved, TimedDataset};
use crate::index::{position, slice_positions, DatasetIndex, SliceKind, Step};
use crate::timestamp::TimestampPattern;

/// Default search radius for `latest` and `around`.
pub const DEFAULT_WITHIN_MINUTES: i64 = 40;

/// How far back an open-ended time slice reaches.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// A remote source with one catalog per UTC day.
#[async_trait]
pub trait DayCatalogSource: Send + Sync {
    /// Short description for logs, e.g. `WV/EAST-CONUS_4km`.
    fn label(&self) -> String;

    fn timestamp_pattern(&self) -> TimestampPattern;

    /// Catalog for `date`, or the source's "current" catalog for `None`.
    async fn catalog_for(&self, date: Option<NaiveDate>) -> WxResult<Catalog>;
}

/// Time-indexed access to a [`DayCatalogSource`].
pub struct DayPartitionedSelection<S> {
    source: S,
    clock: Arc<dyn Clock>,
    default_within: Duration,
    lookback: Duration,
}

impl<S: DayCatalogSource> DayPartitionedSelection<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            default_within: Duration::minutes(DEFAULT_WITHIN_MINUTES),
            lookback: Duration::days(DEFAULT_LOOKBACK_DAYS),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Datasets on one day; a catalog that cannot be fetched counts as empty.
    pub async fn datasets_on(&self, date: NaiveDate, order: SortOrder) -> WxResult<Vec<TimedDataset>> {
        match self.source.catalog_for(Some(date)).await {
            Ok(catalog) => Ok(sorted_datasets(catalog, self.source.timestamp_pattern(), order)),
            Err(e) if e.is_missing_catalog() => {
                debug!(source = %self.source.label(), %date, error = %e, "No catalog for day");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Datasets with `t1 <= ts < t2`, walking day catalogs in `order`.
    pub async fn datasets_between(
        &self,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
        order: SortOrder,
    ) -> WxResult<Vec<TimedDataset>> {
        let range = match TimeRange::new(t1, t2) {
            Ok(r) => r,
            Err(_) => return Ok(Vec::new()),
        };
        let mut days = range.days();
        if order.is_descending() {
            days.reverse();
        }

        let mut found = Vec::new();
        for day in days {
            found.extend(
                self.datasets_on(day, order)
                    .await?
                    .into_iter()
                    .filter(|ds| range.contains(&ds.timestamp)),
            );
        }
        Ok(found)
    }

    /// Most recent dataset in `[now - within, now)`.
    pub async fn latest(&self, within: Option<Duration>) -> WxResult<TimedDataset> {
        let within = within.unwrap_or(self.default_within);
        let now = self.clock.now();
        let found = self
            .datasets_between(now - within, now, SortOrder::Desc)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                WxError::access(format!(
                    "No datasets found within {} minutes of {}",
                    within.num_minutes(),
                    now
                ))
            })?;
        info!(source = %self.source.label(), dataset = %found.name(), "Selected latest dataset");
        Ok(found)
    }

    /// Dataset closest to `when` within `[when - within, when + within)`.
    /// Ties go to the earlier dataset.
    pub async fn around(&self, when: DateTime<Utc>, within: Option<Duration>) -> WxResult<TimedDataset> {
        let within = within.unwrap_or(self.default_within);
        self.datasets_between(when - within, when + within, SortOrder::Asc)
            .await?
            .into_iter()
            .min_by_key(|ds| ((ds.timestamp - when).num_milliseconds().abs(), ds.timestamp))
            .ok_or_else(|| {
                WxError::access(format!(
                    "No datasets found around: {} +/- {} minutes",
                    when,
                    within.num_minutes()
                ))
            })
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
        self.datasets_between(t1, t2, order).await
    }

    pub async fn since(&self, when: DateTime<Utc>, order: SortOrder) -> WxResult<Vec<TimedDataset>> {
        self.between(when, self.clock.now(), order).await
    }

    /// True when the day catalog of `timestamp` holds a dataset stamped
    /// exactly `timestamp`.
    pub async fn contains(&self, timestamp: DateTime<Utc>) -> WxResult<bool> {
        Ok(self
            .datasets_on(timestamp.date_naive(), SortOrder::Asc)
            .await?
            .iter()
            .any(|ds| ds.timestamp == timestamp))
    }

    /// Resolve a position, timestamp or slice.
    pub async fn get(&self, index: impl Into<DatasetIndex>) -> WxResult<Resolved> {
        match index.into() {
            DatasetIndex::Position(i) => {
                let current = self.current().await?;
                let pos = position(current.len(), i).ok_or_else(|| {
                    WxError::access(format!("Index: {} out of bounds of {} datasets", i, current.len()))
                })?;
                Ok(Resolved::One(current[pos].clone()))
            }
            DatasetIndex::Timestamp(ts) => self
                .datasets_on(ts.date_naive(), SortOrder::Asc)
                .await?
                .into_iter()
                .find(|ds| ds.timestamp == ts)
                .map(Resolved::One)
                .ok_or_else(|| WxError::access(format!("Dataset for timestamp: {} not found", ts))),
            DatasetIndex::Slice(slice) => match slice.classify()? {
                SliceKind::Index { start, stop, stride } => {
                    let current = self.current().await?;
                    let picked = slice_positions(current.len(), start, stop, stride)
                        .into_iter()
                        .map(|p| current[p].clone())
                        .collect();
                    Ok(Resolved::Many(picked))
                }
                SliceKind::Time { start, stop, step } => {
                    let stop = stop.unwrap_or_else(|| self.clock.now());
                    let start = start.unwrap_or(stop - self.lookback);
                    self.time_slice(start, stop, step).await.map(Resolved::Many)
                }
            },
        }
    }

    async fn current(&self) -> WxResult<Vec<TimedDataset>> {
        let catalog = self.source.catalog_for(None).await?;
        Ok(sorted_datasets(catalog, self.source.timestamp_pattern(), SortOrder::Asc))
    }

    async fn time_slice(
        &self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step: Option<Step>,
    ) -> WxResult<Vec<TimedDataset>> {
        match step {
            None => self.datasets_between(start, stop, SortOrder::Asc).await,
            Some(Step::Stride(n)) => Ok(self
                .datasets_between(start, stop, SortOrder::Asc)
                .await?
                .into_iter()
                .step_by(n.max(1))
                .collect()),
            Some(Step::Every(delta)) => {
                // Buckets are [start + k*delta, start + (k+1)*delta) clipped to
                // stop; each keeps its earliest dataset. Candidates are sorted
                // so one pass suffices.
                let step_ms = delta.num_milliseconds().max(1);
                let mut picked = Vec::new();
                let mut next_bucket = start;
                for ds in self.datasets_between(start, stop, SortOrder::Asc).await? {
                    if ds.timestamp < next_bucket {
                        continue;
                    }
                    let bucket = (ds.timestamp - start).num_milliseconds() / step_ms;
                    next_bucket = start + Duration::milliseconds((bucket + 1) * step_ms);
                    picked.push(ds);
                }
                Ok(picked)
            }
        }
    }
}
