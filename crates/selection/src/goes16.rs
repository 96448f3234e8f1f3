//! GOES-16 sectorized imagery on THREDDS.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thredds::{Catalog, CatalogFetcher};
use tracing::{debug, info};
use wx_common::{SortOrder, WxError, WxResult};

use crate::dataset::{sorted_datasets, TimedDataset};
use crate::day_partitioned::{DayCatalogSource, DayPartitionedSelection};
use crate::timestamp::TimestampPattern;

pub const DEFAULT_GOES16_BASE: &str =
    "http://thredds-jumbo.unidata.ucar.edu/thredds/catalog/satellite/goes16/GOES16/";

/// Catalogs before this date are laid out date first.
const LAYOUT_CHANGE: (i32, u32, u32) = (2017, 6, 21);

pub type Goes16Selection = DayPartitionedSelection<Goes16Source>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goes16Sector {
    Conus,
    Mesoscale1,
    Mesoscale2,
    FullDisk,
    PuertoRico,
}

impl Goes16Sector {
    pub fn catalog_name(&self) -> &'static str {
        match self {
            Goes16Sector::Conus => "CONUS",
            Goes16Sector::Mesoscale1 => "Mesoscale-1",
            Goes16Sector::Mesoscale2 => "Mesoscale-2",
            Goes16Sector::FullDisk => "FullDisk",
            Goes16Sector::PuertoRico => "PRREGI",
        }
    }
}

impl fmt::Display for Goes16Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

impl FromStr for Goes16Sector {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conus" => Ok(Goes16Sector::Conus),
            "meso1" | "mesoscale-1" => Ok(Goes16Sector::Mesoscale1),
            "meso2" | "mesoscale-2" => Ok(Goes16Sector::Mesoscale2),
            "fulldisk" | "full-disk" => Ok(Goes16Sector::FullDisk),
            "puertorico" | "prregi" => Ok(Goes16Sector::PuertoRico),
            other => Err(WxError::invalid(format!("Unknown GOES-16 sector: {}", other))),
        }
    }
}

pub struct Goes16Source {
    fetcher: Arc<dyn CatalogFetcher>,
    base_url: String,
    sector: Goes16Sector,
    channel: u8,
}

impl Goes16Source {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>, base_url: &str, sector: Goes16Sector, channel: u8) -> WxResult<Self> {
        if !(1..=16).contains(&channel) {
            return Err(WxError::invalid(format!("Invalid GOES-16 channel: {}", channel)));
        }
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            fetcher,
            base_url,
            sector,
            channel,
        })
    }

    pub fn sector(&self) -> Goes16Sector {
        self.sector
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    fn channel_dir(&self) -> String {
        format!("Channel{:02}", self.channel)
    }

    pub fn catalog_url(&self, date: NaiveDate) -> String {
        let day = date.format("%Y%m%d");
        let switch = NaiveDate::from_ymd_opt(LAYOUT_CHANGE.0, LAYOUT_CHANGE.1, LAYOUT_CHANGE.2);
        if switch.map(|s| date < s).unwrap_or(false) {
            format!("{}{}/{}/{}/catalog.xml", self.base_url, day, self.sector, self.channel_dir())
        } else {
            format!("{}{}/{}/{}/catalog.xml", self.base_url, self.sector, self.channel_dir(), day)
        }
    }

    /// Dates with a catalog, read from the catalog references of both the
    /// root catalog and the sector/channel catalog.
    pub async fn available_dates(&self) -> WxResult<Vec<NaiveDate>> {
        let parents = [
            format!("{}catalog.xml", self.base_url),
            format!("{}{}/{}/catalog.xml", self.base_url, self.sector, self.channel_dir()),
        ];

        let mut dates = BTreeSet::new();
        for url in &parents {
            match self.fetcher.fetch_catalog(url).await {
                Ok(catalog) => dates.extend(
                    catalog
                        .catalog_refs
                        .keys()
                        .filter_map(|title| NaiveDate::parse_from_str(title, "%Y%m%d").ok()),
                ),
                Err(e) if e.is_missing_catalog() => debug!(%url, error = %e, "No parent catalog"),
                Err(e) => return Err(e),
            }
        }

        if dates.is_empty() {
            return Err(WxError::access(format!("No dates in TDS catalog: {}", parents[0])));
        }
        Ok(dates.into_iter().collect())
    }
}

#[async_trait]
impl DayCatalogSource for Goes16Source {
    fn label(&self) -> String {
        format!("GOES16/{}/{}", self.sector, self.channel_dir())
    }

    fn timestamp_pattern(&self) -> TimestampPattern {
        TimestampPattern::Goes16
    }

    /// `None` resolves to the most recent available date.
    async fn catalog_for(&self, date: Option<NaiveDate>) -> WxResult<Catalog> {
        let date = match date {
            Some(d) => d,
            None => *self
                .available_dates()
                .await?
                .last()
                .ok_or_else(|| WxError::access("No dates available"))?,
        };
        self.fetcher.fetch_catalog(&self.catalog_url(date)).await
    }
}

impl DayPartitionedSelection<Goes16Source> {
    pub async fn available_dates(&self) -> WxResult<Vec<NaiveDate>> {
        self.source().available_dates().await
    }

    /// Dataset nearest to `when` on its day. Fails with `InvalidValue` when
    /// that day has no catalog.
    pub async fn closest_to(&self, when: DateTime<Utc>) -> WxResult<TimedDataset> {
        let dates = self.available_dates().await?;
        let day = when.date_naive();
        if !dates.contains(&day) {
            let first = dates.first().map(|d| d.to_string()).unwrap_or_default();
            let last = dates.last().map(|d| d.to_string()).unwrap_or_default();
            return Err(WxError::invalid(format!(
                "Queried time out of range: {}. Range of dates is {} to {}",
                day, first, last
            )));
        }

        let catalog = self.source().catalog_for(Some(day)).await?;
        let found = sorted_datasets(catalog, TimestampPattern::Goes16, SortOrder::Asc)
            .into_iter()
            .min_by_key(|ds| ((ds.timestamp - when).num_milliseconds().abs(), ds.timestamp))
            .ok_or_else(|| WxError::access(format!("No datasets on {}", day)))?;
        info!(dataset = %found.name(), "Selected closest GOES-16 dataset");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFetch;

    #[async_trait]
    impl CatalogFetcher for NoFetch {
        async fn fetch_text(&self, url: &str) -> WxResult<String> {
            Err(WxError::CatalogNotFound(url.to_string()))
        }
    }

    #[test]
    fn test_catalog_layout_switch() {
        let source = Goes16Source::new(Arc::new(NoFetch), "http://host/GOES16", Goes16Sector::Conus, 1).unwrap();
        assert_eq!(
            source.catalog_url(NaiveDate::from_ymd_opt(2017, 6, 18).unwrap()),
            "http://host/GOES16/20170618/CONUS/Channel01/catalog.xml"
        );
        assert_eq!(
            source.catalog_url(NaiveDate::from_ymd_opt(2017, 6, 21).unwrap()),
            "http://host/GOES16/CONUS/Channel01/20170621/catalog.xml"
        );
    }

    #[test]
    fn test_sector_parse() {
        assert_eq!("meso1".parse::<Goes16Sector>().unwrap(), Goes16Sector::Mesoscale1);
        assert_eq!("PRREGI".parse::<Goes16Sector>().unwrap(), Goes16Sector::PuertoRico);
        assert!("nowhere".parse::<Goes16Sector>().is_err());
    }

    #[test]
    fn test_channel_range() {
        assert!(Goes16Source::new(Arc::new(NoFetch), DEFAULT_GOES16_BASE, Goes16Sector::Conus, 0).is_err());
        assert!(Goes16Source::new(Arc::new(NoFetch), DEFAULT_GOES16_BASE, Goes16Sector::Conus, 17).is_err());
    }
}
