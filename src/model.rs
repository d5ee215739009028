/// StationRecord, Measurements, Trend, Snapshot, ScrapeError
/// core data structures and error handling
///
/// Core data types for the ARSO water station service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O. The serde attributes here define the exact shape of
/// the persisted snapshot document read by the map front-end.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Trend tokens
// ---------------------------------------------------------------------------

/// Substring in the ARSO trend column meaning the level is rising.
pub const TREND_RISING: &str = "narašča";

/// Substring in the ARSO trend column meaning the level is falling.
pub const TREND_FALLING: &str = "pada";

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Coarse direction of a station's recent water level.
///
/// Serialized as the Slovenian token the page uses, since the map
/// front-end matches on those strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "narašča")]
    Rising,
    #[serde(rename = "pada")]
    Falling,
}

impl Trend {
    /// Detects a trend from raw cell text. Anything other than the two
    /// known tokens (including blank) yields `None`.
    pub fn from_cell(text: &str) -> Option<Trend> {
        if text.contains(TREND_RISING) {
            Some(Trend::Rising)
        } else if text.contains(TREND_FALLING) {
            Some(Trend::Falling)
        } else {
            None
        }
    }
}

/// WGS84 position of a station, serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<[f64; 2]> for Coordinate {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Coordinate { latitude, longitude }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.latitude, c.longitude]
    }
}

/// Measured values for one station. Any field may be `None` when the
/// page leaves the cell blank or the text is not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(rename = "waterLevel")]
    pub water_level_cm: Option<f64>,
    #[serde(rename = "flow")]
    pub flow_m3s: Option<f64>,
    #[serde(rename = "temperature")]
    pub temperature_c: Option<f64>,
    pub trend: Option<Trend>,
    /// Capture time of the run, not a value read from the page.
    #[serde(rename = "timestamp", with = "iso_millis")]
    pub observed_at: DateTime<Utc>,
}

/// One row of the ARSO station table that survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub name: String,
    pub river: Option<String>,
    #[serde(rename = "coordinates")]
    pub coordinate: Coordinate,
    #[serde(rename = "data")]
    pub measurements: Measurements,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The persisted unit: every station known at `last_updated`.
///
/// Fields are private so `station_count` can only be computed by
/// `Snapshot::new` and always equals `stations.len()`. Reading a document
/// back goes through `new` as well; a stored `stationCount` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot")]
pub struct Snapshot {
    #[serde(rename = "lastUpdated", with = "iso_millis")]
    last_updated: DateTime<Utc>,
    #[serde(rename = "stationCount")]
    station_count: usize,
    stations: Vec<StationRecord>,
}

/// Document shape as found on disk, before the count is recomputed.
#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(rename = "lastUpdated", with = "iso_millis")]
    last_updated: DateTime<Utc>,
    stations: Vec<StationRecord>,
}

impl From<RawSnapshot> for Snapshot {
    fn from(raw: RawSnapshot) -> Self {
        Snapshot::new(raw.stations, raw.last_updated)
    }
}

impl Snapshot {
    pub fn new(stations: Vec<StationRecord>, last_updated: DateTime<Utc>) -> Self {
        Snapshot {
            last_updated,
            station_count: stations.len(),
            stations,
        }
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn station_count(&self) -> usize {
        self.station_count
    }

    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    pub fn find(&self, name: &str) -> Option<&StationRecord> {
        self.stations.iter().find(|s| s.name == name)
    }
}

/// Formats timestamps like JavaScript's `toISOString()`:
/// `2025-06-01T08:30:00.000Z`.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use super::*;

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that end a scrape run. None of them are retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeError {
    /// Network or transport failure while fetching the page.
    Fetch(String),
    /// Non-2xx HTTP response from the ARSO site.
    HttpStatus(u16),
    /// The markup could not be turned into a document.
    ParseError(String),
    /// No table passed the structural checks. Holds the truncated
    /// header text of every candidate table, in document order.
    NoDataTableFound { candidates: Vec<String> },
    /// Writing the snapshot failed.
    Persistence(String),
}

impl ScrapeError {
    /// True for both fetch flavours (transport and HTTP status).
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScrapeError::Fetch(_) | ScrapeError::HttpStatus(_))
    }
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            ScrapeError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            ScrapeError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ScrapeError::NoDataTableFound { candidates } => {
                write!(f, "Could not find the main data table ({} candidates)", candidates.len())
            }
            ScrapeError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for ScrapeError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    fn record(name: &str) -> StationRecord {
        StationRecord {
            name: name.to_string(),
            river: Some("Sava".to_string()),
            coordinate: Coordinate { latitude: 46.0575677, longitude: 14.8314192 },
            measurements: Measurements {
                water_level_cm: Some(123.4),
                flow_m3s: None,
                temperature_c: Some(8.9),
                trend: Some(Trend::Falling),
                observed_at: fixed_now(),
            },
        }
    }

    #[test]
    fn test_trend_detection_recognizes_only_known_tokens() {
        assert_eq!(Trend::from_cell("narašča"), Some(Trend::Rising));
        assert_eq!(Trend::from_cell("  pada "), Some(Trend::Falling));
        assert_eq!(Trend::from_cell(""), None);
        assert_eq!(Trend::from_cell("stagnira"), None);
    }

    #[test]
    fn test_snapshot_station_count_matches_stations() {
        let snap = Snapshot::new(vec![record("Litija"), record("Hrastnik")], fixed_now());
        assert_eq!(snap.station_count(), 2);
        assert_eq!(snap.station_count(), snap.stations().len());
        assert!(snap.find("Hrastnik").is_some());
        assert!(snap.find("Postojna").is_none());
    }

    #[test]
    fn test_snapshot_serializes_to_document_shape() {
        let snap = Snapshot::new(vec![record("Litija")], fixed_now());
        let json = serde_json::to_value(&snap).unwrap();

        assert_eq!(json["lastUpdated"], "2025-06-01T08:30:00.000Z");
        assert_eq!(json["stationCount"], 1);
        let station = &json["stations"][0];
        assert_eq!(station["name"], "Litija");
        assert_eq!(station["river"], "Sava");
        assert_eq!(station["coordinates"][0], 46.0575677);
        assert_eq!(station["coordinates"][1], 14.8314192);
        assert_eq!(station["data"]["waterLevel"], 123.4);
        assert!(station["data"]["flow"].is_null());
        assert_eq!(station["data"]["temperature"], 8.9);
        assert_eq!(station["data"]["trend"], "pada");
        assert_eq!(station["data"]["timestamp"], "2025-06-01T08:30:00.000Z");
    }

    #[test]
    fn test_error_display_and_fetch_grouping() {
        assert_eq!(ScrapeError::HttpStatus(503).to_string(), "HTTP error: 503");
        assert!(ScrapeError::HttpStatus(503).is_fetch());
        assert!(ScrapeError::Fetch("timed out".into()).is_fetch());
        assert!(!ScrapeError::Persistence("disk full".into()).is_fetch());
    }
}
