//! Apply a [`TimeQuery`] to a dataset selection.

use selection::{DayCatalogSource, DayPartitionedSelection, RadarCatalogSource, RadarSelection, TimedDataset};
use wx_common::{SortOrder, WxResult};

use crate::cli::TimeQuery;

pub async fn day_partitioned<S: DayCatalogSource>(
    selection: &DayPartitionedSelection<S>,
    query: &TimeQuery,
) -> WxResult<Vec<TimedDataset>> {
    match query {
        TimeQuery::Latest(within) => Ok(vec![selection.latest(*within).await?]),
        TimeQuery::Around(when, within) => Ok(vec![selection.around(*when, *within).await?]),
        TimeQuery::Between(start, end) => selection.between(*start, *end, SortOrder::Asc).await,
        TimeQuery::Since(start) => selection.since(*start, SortOrder::Asc).await,
    }
}

/// Radar servers answer "latest" and "nearest" themselves, so look-back
/// windows are ignored here.
pub async fn radar<S: RadarCatalogSource>(
    selection: &RadarSelection<S>,
    query: &TimeQuery,
) -> WxResult<Vec<TimedDataset>> {
    match query {
        TimeQuery::Latest(_) => Ok(vec![selection.latest().await?]),
        TimeQuery::Around(when, _) => Ok(vec![selection.around(*when).await?]),
        TimeQuery::Between(start, end) => selection.between(*start, *end, SortOrder::Asc).await,
        TimeQuery::Since(start) => selection.since(*start, SortOrder::Asc).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use selection::{GoesLegacySelection, GoesLegacySource};
    use test_utils::{dataset_catalog_xml, StaticCatalogFetcher, GOES_LEGACY_WV_KEYS};
    use wx_common::FixedClock;

    const BASE: &str = "http://thredds.test/thredds/catalog/satellite/";

    fn selection() -> GoesLegacySelection {
        let xml = dataset_catalog_xml("satellite/WV/EAST-CONUS_4km/20160128/", &GOES_LEGACY_WV_KEYS);
        let fetcher = StaticCatalogFetcher::new()
            .with(format!("{}WV/EAST-CONUS_4km/20160128/catalog.xml", BASE), xml.clone())
            .with(format!("{}WV/EAST-CONUS_4km/current/catalog.xml", BASE), xml);
        let source = GoesLegacySource::new(Arc::new(fetcher), BASE, "WV", "EAST-CONUS_4km");
        let now = Utc.with_ymd_and_hms(2016, 1, 28, 7, 50, 0).unwrap();
        GoesLegacySelection::with_clock(source, Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_latest_is_single_dataset() {
        let found = day_partitioned(&selection(), &TimeQuery::Latest(None)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "EAST-CONUS_4km_WV_20160128_0745.gini");
    }

    #[tokio::test]
    async fn test_between_is_ascending() {
        let start = Utc.with_ymd_and_hms(2016, 1, 28, 5, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2016, 1, 28, 8, 0, 0).unwrap();
        let found = day_partitioned(&selection(), &TimeQuery::Between(start, end)).await.unwrap();
        assert!(found.len() > 1);
        assert!(found.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(found.iter().all(|ds| ds.timestamp >= start && ds.timestamp < end));
    }
}
