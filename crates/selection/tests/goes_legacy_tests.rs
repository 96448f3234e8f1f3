//! Day-partitioned selection against canned GOES legacy catalogs.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use selection::{
    DatasetIndex, DatasetSlice, GoesLegacySelection, GoesLegacySource, Resolved, SliceBound, Step,
};
use test_utils::{dataset_catalog_xml, BrokenFetcher, StaticCatalogFetcher, GOES_LEGACY_WV_KEYS};
use wx_common::{FixedClock, SortOrder, WxError};

const BASE: &str = "http://thredds.test/thredds/catalog/satellite/";
const DAY_URL: &str = "http://thredds.test/thredds/catalog/satellite/WV/EAST-CONUS_4km/20160128/catalog.xml";
const CURRENT_URL: &str = "http://thredds.test/thredds/catalog/satellite/WV/EAST-CONUS_4km/current/catalog.xml";

fn t(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 1, d, h, m, 0).unwrap()
}

fn fetcher() -> Arc<StaticCatalogFetcher> {
    let xml = dataset_catalog_xml("satellite/WV/EAST-CONUS_4km/20160128/", &GOES_LEGACY_WV_KEYS);
    Arc::new(
        StaticCatalogFetcher::new()
            .with(DAY_URL, xml.clone())
            .with(CURRENT_URL, xml),
    )
}

fn selection_at(now: DateTime<Utc>) -> (GoesLegacySelection, Arc<StaticCatalogFetcher>) {
    let fetcher = fetcher();
    let source = GoesLegacySource::new(fetcher.clone(), BASE, "WV", "EAST-CONUS_4km");
    (GoesLegacySelection::with_clock(source, Arc::new(FixedClock(now))), fetcher)
}

fn selection() -> GoesLegacySelection {
    selection_at(t(28, 7, 50)).0
}

fn names(found: &[selection::TimedDataset]) -> Vec<&str> {
    found.iter().map(|ds| ds.name()).collect()
}

#[tokio::test]
async fn test_latest_with_default_radius() {
    let latest = selection().latest(None).await.unwrap();
    assert_eq!(latest.name(), "EAST-CONUS_4km_WV_20160128_0745.gini");
    assert_eq!(latest.timestamp, t(28, 7, 45));
}

#[tokio::test]
async fn test_latest_outside_custom_radius_fails() {
    let err = selection().latest(Some(Duration::minutes(1))).await.unwrap_err();
    assert!(matches!(err, WxError::DatasetAccess(_)));
}

#[tokio::test]
async fn test_around_default_radius() {
    let found = selection().around(t(28, 6, 45), None).await.unwrap();
    assert_eq!(found.name(), "EAST-CONUS_4km_WV_20160128_0630.gini");
}

#[tokio::test]
async fn test_around_custom_radius() {
    let found = selection().around(t(28, 4, 35), Some(Duration::hours(1))).await.unwrap();
    assert_eq!(found.name(), "EAST-CONUS_4km_WV_20160128_0530.gini");
}

#[tokio::test]
async fn test_around_with_nothing_in_range() {
    let err = selection().around(t(28, 1, 0), None).await.unwrap_err();
    assert!(matches!(err, WxError::DatasetAccess(_)));
}

#[tokio::test]
async fn test_between_excludes_upper_bound() {
    let found = selection()
        .between(t(27, 23, 0), t(28, 7, 15), SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(
        names(&found),
        vec!["EAST-CONUS_4km_WV_20160128_0530.gini", "EAST-CONUS_4km_WV_20160128_0630.gini"]
    );
}

#[tokio::test]
async fn test_between_includes_lower_bound() {
    let found = selection()
        .between(t(28, 7, 15), t(30, 7, 15), SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(
        names(&found),
        vec!["EAST-CONUS_4km_WV_20160128_0715.gini", "EAST-CONUS_4km_WV_20160128_0745.gini"]
    );
}

#[tokio::test]
async fn test_between_descending_walks_days_backwards() {
    let (sel, fetcher) = selection_at(t(28, 7, 50));
    let found = sel.between(t(27, 0, 0), t(29, 0, 0), SortOrder::Desc).await.unwrap();
    assert_eq!(found.len(), 4);
    assert_eq!(found[0].name(), "EAST-CONUS_4km_WV_20160128_0745.gini");
    assert_eq!(found[3].name(), "EAST-CONUS_4km_WV_20160128_0530.gini");

    let requested = fetcher.requested();
    assert!(requested[0].ends_with("/20160129/catalog.xml"));
    assert!(requested[2].ends_with("/20160127/catalog.xml"));
}

#[tokio::test]
async fn test_between_rejects_inverted_bounds() {
    let err = selection()
        .between(t(28, 8, 0), t(28, 7, 0), SortOrder::Asc)
        .await
        .unwrap_err();
    assert!(matches!(err, WxError::InvalidValue(_)));
}

#[tokio::test]
async fn test_since_uses_clock() {
    let found = selection().since(t(28, 7, 0), SortOrder::Asc).await.unwrap();
    assert_eq!(
        names(&found),
        vec!["EAST-CONUS_4km_WV_20160128_0715.gini", "EAST-CONUS_4km_WV_20160128_0745.gini"]
    );
}

#[tokio::test]
async fn test_contains_exact_timestamp() {
    let sel = selection();
    assert!(sel.contains(t(28, 6, 30)).await.unwrap());
    assert!(!sel.contains(t(28, 6, 31)).await.unwrap());
    assert!(!sel.contains(t(20, 6, 30)).await.unwrap());
}

#[tokio::test]
async fn test_get_by_position() {
    let sel = selection();
    let last = sel.get(-1isize).await.unwrap().single().unwrap();
    assert_eq!(last.name(), "EAST-CONUS_4km_WV_20160128_0745.gini");
    let first = sel.get(0isize).await.unwrap().single().unwrap();
    assert_eq!(first.name(), "EAST-CONUS_4km_WV_20160128_0530.gini");

    let err = sel.get(10isize).await.unwrap_err();
    assert!(matches!(err, WxError::DatasetAccess(_)));
}

#[tokio::test]
async fn test_get_by_timestamp() {
    let sel = selection();
    let found = sel.get(t(28, 6, 30)).await.unwrap();
    assert_eq!(found.names(), vec!["EAST-CONUS_4km_WV_20160128_0630.gini"]);

    let err = sel.get(t(28, 6, 31)).await.unwrap_err();
    assert!(matches!(err, WxError::DatasetAccess(_)));
}

#[tokio::test]
async fn test_get_index_slices() {
    let sel = selection();
    let middle = sel.get(DatasetSlice::indices(Some(1), Some(3))).await.unwrap();
    assert_eq!(
        middle.names(),
        vec!["EAST-CONUS_4km_WV_20160128_0630.gini", "EAST-CONUS_4km_WV_20160128_0715.gini"]
    );

    let every_other = sel
        .get(DatasetSlice::full().with_step(Step::Stride(2)))
        .await
        .unwrap();
    assert_eq!(
        every_other.names(),
        vec!["EAST-CONUS_4km_WV_20160128_0530.gini", "EAST-CONUS_4km_WV_20160128_0715.gini"]
    );

    let tail = sel.get(DatasetSlice::indices(Some(-1), None)).await.unwrap();
    assert!(matches!(tail, Resolved::Many(ref v) if v.len() == 1));
}

#[tokio::test]
async fn test_get_time_slice() {
    let found = selection()
        .get(DatasetSlice::times(Some(t(28, 6, 0)), Some(t(28, 7, 45))))
        .await
        .unwrap();
    assert_eq!(
        found.names(),
        vec!["EAST-CONUS_4km_WV_20160128_0630.gini", "EAST-CONUS_4km_WV_20160128_0715.gini"]
    );
}

#[tokio::test]
async fn test_get_time_slice_every_hour_skips_empty_ticks() {
    let slice = DatasetSlice::times(Some(t(28, 5, 0)), Some(t(28, 8, 0))).with_step(Step::Every(Duration::hours(1)));
    let found = selection().get(slice).await.unwrap();
    assert_eq!(
        found.names(),
        vec![
            "EAST-CONUS_4km_WV_20160128_0530.gini",
            "EAST-CONUS_4km_WV_20160128_0630.gini",
            "EAST-CONUS_4km_WV_20160128_0715.gini",
        ]
    );
}

#[tokio::test]
async fn test_get_time_slice_every_stays_below_stop() {
    let slice = DatasetSlice::times(Some(t(28, 5, 0)), Some(t(28, 7, 0))).with_step(Step::Every(Duration::hours(1)));
    let found = selection().get(slice).await.unwrap();
    assert_eq!(
        found.names(),
        vec!["EAST-CONUS_4km_WV_20160128_0530.gini", "EAST-CONUS_4km_WV_20160128_0630.gini"]
    );
    assert!(found.into_vec().iter().all(|ds| ds.timestamp < t(28, 7, 0)));
}

#[tokio::test]
async fn test_open_ended_time_slice_stops_at_clock_now() {
    let mut keys = GOES_LEGACY_WV_KEYS.to_vec();
    keys.push("EAST-CONUS_4km_WV_20160128_0755.gini");
    let xml = dataset_catalog_xml("satellite/WV/EAST-CONUS_4km/20160128/", &keys);
    let fetcher = Arc::new(StaticCatalogFetcher::new().with(DAY_URL, xml.clone()).with(CURRENT_URL, xml));
    let source = GoesLegacySource::new(fetcher, BASE, "WV", "EAST-CONUS_4km");
    let sel = GoesLegacySelection::with_clock(source, Arc::new(FixedClock(t(28, 7, 50))));

    let found = sel.get(DatasetSlice::times(Some(t(28, 0, 0)), None)).await.unwrap();
    assert_eq!(found.names().len(), 4);
    assert!(!found.names().contains(&"EAST-CONUS_4km_WV_20160128_0755.gini"));
}

#[tokio::test]
async fn test_get_time_slice_with_stride() {
    let slice = DatasetSlice::times(Some(t(28, 0, 0)), None).with_step(Step::Stride(3));
    let found = selection().get(slice).await.unwrap();
    assert_eq!(
        found.names(),
        vec!["EAST-CONUS_4km_WV_20160128_0530.gini", "EAST-CONUS_4km_WV_20160128_0745.gini"]
    );
}

#[tokio::test]
async fn test_open_start_time_slice_looks_back() {
    let slice = DatasetSlice::times(None, Some(t(28, 7, 0)));
    let found = selection().get(slice).await.unwrap();
    assert_eq!(found.names().len(), 2);
}

#[tokio::test]
async fn test_mixed_slice_rejected() {
    let slice = DatasetSlice::new(Some(SliceBound::Index(0)), Some(SliceBound::Time(t(28, 7, 0))));
    let err = selection().get(DatasetIndex::Slice(slice)).await.unwrap_err();
    assert!(matches!(err, WxError::InvalidValue(_)));
}

#[tokio::test]
async fn test_non_http_errors_propagate() {
    let source = GoesLegacySource::new(Arc::new(BrokenFetcher), BASE, "WV", "EAST-CONUS_4km");
    let sel = GoesLegacySelection::with_clock(source, Arc::new(FixedClock(t(28, 7, 50))));
    let err = sel.latest(None).await.unwrap_err();
    assert!(matches!(err, WxError::CatalogInit(_)));
}

#[tokio::test]
async fn test_opendap_url_of_selected_dataset() {
    let latest = selection().latest(None).await.unwrap();
    assert_eq!(
        latest.opendap_url().unwrap(),
        "http://thredds.test/thredds/dodsC/satellite/WV/EAST-CONUS_4km/20160128/EAST-CONUS_4km_WV_20160128_0745.gini"
    );
}
