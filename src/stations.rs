/// Station coordinate lookup for the ARSO scrape service.
///
/// The ARSO page lists stations by name only. Positions come from a
/// separately geocoded JSON document mapping each station name to a
/// `[latitude, longitude]` pair. This is the single source of truth for
/// station positions — a station missing here never reaches the snapshot.
///
/// The lookup is an explicit value built once by the caller and handed to
/// the pipeline; nothing in this module holds global state.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::logging::{self, Source};
use crate::model::Coordinate;

/// Default location of the geocoder's output.
pub const DEFAULT_COORDINATES_PATH: &str = "geocoded-coordinates.json";

// ---------------------------------------------------------------------------
// Lookup document
// ---------------------------------------------------------------------------

/// Accepted layouts of the coordinate document: the geocoder's
/// `{"coordinates": {...}}` wrapper, or a bare name → pair map.
///
/// Entries stay untyped here so one bad value (a `null` left by a failed
/// geocode) only drops that station, not the whole document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoordinateDocument {
    Wrapped { coordinates: HashMap<String, Value> },
    Bare(HashMap<String, Value>),
}

impl CoordinateDocument {
    fn into_map(self) -> HashMap<String, Value> {
        match self {
            CoordinateDocument::Wrapped { coordinates } => coordinates,
            CoordinateDocument::Bare(map) => map,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Immutable station name → coordinate map. Matching is exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateLookup {
    coordinates: HashMap<String, Coordinate>,
}

impl CoordinateLookup {
    /// An empty lookup. Every station is excluded when this is used.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a coordinate document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let doc: CoordinateDocument = serde_json::from_str(text)?;
        Ok(doc
            .into_map()
            .into_iter()
            .filter_map(|(name, value)| match serde_json::from_value::<[f64; 2]>(value) {
                Ok(pair) => Some((name, Coordinate::from(pair))),
                Err(e) => {
                    logging::warn(
                        Source::Coordinates,
                        Some(&name),
                        &format!("Skipping unusable coordinate entry: {}", e),
                    );
                    None
                }
            })
            .collect())
    }

    /// Loads the coordinate document at `path`.
    ///
    /// A missing or unreadable document is not fatal: a warning is logged
    /// and an empty lookup is returned, so the run still completes (with
    /// no stations).
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                logging::warn(
                    Source::Coordinates,
                    None,
                    &format!("Could not read {}: {}; using empty lookup", path.display(), e),
                );
                return Self::empty();
            }
        };

        match Self::from_json(&text) {
            Ok(lookup) => {
                logging::info(
                    Source::Coordinates,
                    None,
                    &format!("Loaded {} station coordinates from {}", lookup.len(), path.display()),
                );
                lookup
            }
            Err(e) => {
                logging::warn(
                    Source::Coordinates,
                    None,
                    &format!("Could not parse {}: {}; using empty lookup", path.display(), e),
                );
                Self::empty()
            }
        }
    }

    /// Looks up a station by exact name. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<Coordinate> {
        self.coordinates.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.coordinates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// All station names in the lookup, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.coordinates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Coordinate)> for CoordinateLookup {
    fn from_iter<I: IntoIterator<Item = (String, Coordinate)>>(iter: I) -> Self {
        CoordinateLookup {
            coordinates: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
