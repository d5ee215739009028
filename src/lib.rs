//! ARSO water station scraper.
//!
//! Fetches the ARSO automatic water-station page, picks the station table
//! out of the page, normalizes each row into a `StationRecord` and writes
//! the latest `Snapshot` as JSON for the map front-end.

pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod snapshot;
pub mod stations;
pub mod trigger;
pub mod verify;

pub use model::{Coordinate, Measurements, ScrapeError, Snapshot, StationRecord, Trend};
pub use pipeline::{PipelineState, ScrapePipeline};
pub use stations::CoordinateLookup;
