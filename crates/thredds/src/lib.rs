//! Client for THREDDS Data Server catalogs.
//!
//! - [`catalog`]: `catalog.xml` model and parser
//! - [`client`]: async catalog fetching over HTTP
//! - [`radar_server`]: radar server query protocol (stations, time queries)

pub mod catalog;
pub mod client;
pub mod radar_server;

pub use catalog::{Catalog, CatalogDataset, CatalogRef, Service};
pub use client::{CatalogFetcher, HttpCatalogFetcher};
pub use radar_server::{get_radarserver_datasets, RadarQuery, RadarServer, Station};
