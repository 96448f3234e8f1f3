//! Selected datasets.

use chrono::{DateTime, Utc};
use thredds::{Catalog, CatalogDataset};
use tracing::warn;
use wx_common::{SortOrder, WxError, WxResult};

use crate::timestamp::TimestampPattern;

/// A catalog dataset with the timestamp decoded from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedDataset {
    pub timestamp: DateTime<Utc>,
    pub dataset: CatalogDataset,
}

impl TimedDataset {
    pub fn name(&self) -> &str {
        &self.dataset.name
    }

    pub fn opendap_url(&self) -> WxResult<&str> {
        self.dataset.opendap_url()
    }

    pub fn access_url(&self, service_type: &str) -> WxResult<&str> {
        self.dataset.access_url(service_type).ok_or_else(|| {
            WxError::access(format!(
                "dataset '{}' has no {} access",
                self.dataset.name, service_type
            ))
        })
    }
}

/// Result of resolving a [`DatasetIndex`](crate::DatasetIndex): a position or
/// timestamp yields one dataset, a slice yields many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    One(TimedDataset),
    Many(Vec<TimedDataset>),
}

impl Resolved {
    pub fn into_vec(self) -> Vec<TimedDataset> {
        match self {
            Resolved::One(ds) => vec![ds],
            Resolved::Many(all) => all,
        }
    }

    pub fn single(self) -> Option<TimedDataset> {
        match self {
            Resolved::One(ds) => Some(ds),
            Resolved::Many(_) => None,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Resolved::One(ds) => vec![ds.name()],
            Resolved::Many(all) => all.iter().map(TimedDataset::name).collect(),
        }
    }
}

/// Datasets of `catalog` sorted by timestamp. Names without a timestamp are
/// skipped.
pub(crate) fn sorted_datasets(catalog: Catalog, pattern: TimestampPattern, order: SortOrder) -> Vec<TimedDataset> {
    let mut datasets: Vec<TimedDataset> = catalog
        .datasets
        .into_values()
        .filter_map(|dataset| match pattern.extract(&dataset.name) {
            Ok(timestamp) => Some(TimedDataset { timestamp, dataset }),
            Err(e) => {
                warn!(name = %dataset.name, error = %e, "Skipping dataset without timestamp");
                None
            }
        })
        .collect();
    datasets.sort_by(|a, b| (a.timestamp, a.name()).cmp(&(b.timestamp, b.name())));
    if order.is_descending() {
        datasets.reverse();
    }
    datasets
}
