//! Dataset selection over time-ordered remote catalogs.
//!
//! A selection is bound to one logical source (a satellite sector/channel or
//! a radar station) and translates positions, timestamps and slices into
//! concrete catalog datasets:
//!
//! - [`DayPartitionedSelection`]: catalogs split per UTC day (GOES legacy,
//!   GOES-16), filtered client side.
//! - [`RadarSelection`]: radar server catalogs, filtered server side.

pub mod dataset;
pub mod day_partitioned;
pub mod goes16;
pub mod goes_legacy;
pub mod index;
pub mod nexrad2;
pub mod radar;
pub mod timestamp;

pub use dataset::{Resolved, TimedDataset};
pub use day_partitioned::{DayCatalogSource, DayPartitionedSelection};
pub use goes16::{Goes16Sector, Goes16Selection, Goes16Source, DEFAULT_GOES16_BASE};
pub use goes_legacy::{GoesLegacySelection, GoesLegacySource};
pub use index::{DatasetIndex, DatasetSlice, SliceBound, SliceKind, Step};
pub use nexrad2::{level2_server, nexrad2, Nexrad2Selection, RadarStation};
pub use radar::{RadarCatalogSource, RadarSelection, RadarTimeQuery};
pub use timestamp::TimestampPattern;
