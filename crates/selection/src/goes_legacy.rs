//! GOES legacy (GINI) imagery on THREDDS.
//!
//! Catalogs live at `<base><SATTYPE>/<sector>/<YYYYMMDD>/catalog.xml`, with
//! `current` in place of the date for the most recent day.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thredds::{Catalog, CatalogFetcher};
use wx_common::{WxError, WxResult};

use crate::day_partitioned::{DayCatalogSource, DayPartitionedSelection};
use crate::timestamp::TimestampPattern;

pub type GoesLegacySelection = DayPartitionedSelection<GoesLegacySource>;

pub struct GoesLegacySource {
    fetcher: Arc<dyn CatalogFetcher>,
    base_url: String,
    sattype: String,
    sector: String,
}

impl GoesLegacySource {
    pub fn new(fetcher: Arc<dyn CatalogFetcher>, base_url: &str, sattype: &str, sector: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            fetcher,
            base_url,
            sattype: sattype.to_uppercase(),
            sector: sector.to_string(),
        }
    }

    /// Eastern CONUS sector for `sattype` (`VIS`, `IR` or `WV`).
    pub fn conus_east(fetcher: Arc<dyn CatalogFetcher>, base_url: &str, sattype: &str) -> WxResult<Self> {
        let sector = conus_sector("EAST", sattype)?;
        Ok(Self::new(fetcher, base_url, sattype, &sector))
    }

    /// Western CONUS sector for `sattype` (`VIS`, `IR` or `WV`).
    pub fn conus_west(fetcher: Arc<dyn CatalogFetcher>, base_url: &str, sattype: &str) -> WxResult<Self> {
        let sector = conus_sector("WEST", sattype)?;
        Ok(Self::new(fetcher, base_url, sattype, &sector))
    }

    pub fn sattype(&self) -> &str {
        &self.sattype
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn catalog_url(&self, date: Option<NaiveDate>) -> String {
        let day = date
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| "current".to_string());
        format!("{}{}/{}/{}/catalog.xml", self.base_url, self.sattype, self.sector, day)
    }
}

fn conus_sector(side: &str, sattype: &str) -> WxResult<String> {
    match sattype.to_uppercase().as_str() {
        "VIS" => Ok(format!("{}-CONUS_1km", side)),
        "IR" | "WV" => Ok(format!("{}-CONUS_4km", side)),
        other => Err(WxError::invalid(format!("Sattype: {} not supported", other))),
    }
}

#[async_trait]
impl DayCatalogSource for GoesLegacySource {
    fn label(&self) -> String {
        format!("{}/{}", self.sattype, self.sector)
    }

    fn timestamp_pattern(&self) -> TimestampPattern {
        TimestampPattern::GoesLegacy
    }

    async fn catalog_for(&self, date: Option<NaiveDate>) -> WxResult<Catalog> {
        self.fetcher.fetch_catalog(&self.catalog_url(date)).await
    }
}
