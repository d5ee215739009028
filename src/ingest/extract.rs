//! Turning the station table into `StationRecord`s.
//!
//! Column layout of the ARSO table (positional, no header lookup):
//!
//! | col | content             |
//! |-----|---------------------|
//! | 0   | river               |
//! | 1   | station name        |
//! | 2   | water level (cm)    |
//! | 3   | flow (m³/s)         |
//! | 4   | trend, often blank  |
//! | 5   | temperature (°C)    |

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scraper::ElementRef;

use crate::ingest::table::{cell_texts, table_rows, TableSelectors, FIRST_DATA_ROW, MIN_DATA_CELLS};
use crate::logging::{self, Source};
use crate::model::{Measurements, StationRecord, Trend};
use crate::parse::parse_numeric;
use crate::stations::CoordinateLookup;

/// Raw text of one data row, already split into the mapped columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub river: String,
    pub name: String,
    pub water_level: String,
    pub flow: String,
    pub trend: String,
    pub temperature: String,
}

impl StationRow {
    fn from_cells(mut cells: Vec<String>) -> Option<StationRow> {
        if cells.len() < MIN_DATA_CELLS {
            return None;
        }
        cells.truncate(MIN_DATA_CELLS);
        let mut it = cells.into_iter();
        Some(StationRow {
            river: it.next()?,
            name: it.next()?,
            water_level: it.next()?,
            flow: it.next()?,
            trend: it.next()?,
            temperature: it.next()?,
        })
    }

    /// Measurements parsed field by field; one bad cell does not blank
    /// the others.
    pub fn measurements(&self, observed_at: DateTime<Utc>) -> Measurements {
        Measurements {
            water_level_cm: parse_numeric(Some(&self.water_level)),
            flow_m3s: parse_numeric(Some(&self.flow)),
            temperature_c: parse_numeric(Some(&self.temperature)),
            trend: Trend::from_cell(&self.trend),
            observed_at,
        }
    }
}

/// Data rows of the station table with a non-empty station name, in
/// table order. Rows with too few cells are skipped.
pub fn station_rows(table: ElementRef<'_>, selectors: &TableSelectors) -> Vec<StationRow> {
    table_rows(table, selectors)
        .into_iter()
        .skip(FIRST_DATA_ROW)
        .filter_map(|row| StationRow::from_cells(cell_texts(row, selectors)))
        .filter(|row| !row.name.is_empty())
        .collect()
}

/// Builds station records from the rows of the station table.
///
/// A row is kept only if its station has a known coordinate and its
/// name has not been seen earlier in the table. Every record gets the
/// same `observed_at`.
pub fn extract_stations(
    table: ElementRef<'_>,
    selectors: &TableSelectors,
    lookup: &CoordinateLookup,
    observed_at: DateTime<Utc>,
) -> Vec<StationRecord> {
    let rows = station_rows(table, selectors);
    logging::debug(
        Source::Arso,
        None,
        &format!("Found {} station rows in data table", rows.len()),
    );
    build_records(rows, lookup, observed_at)
}

/// Applies the coordinate filter and first-seen-wins deduplication.
pub fn build_records(
    rows: Vec<StationRow>,
    lookup: &CoordinateLookup,
    observed_at: DateTime<Utc>,
) -> Vec<StationRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(coordinate) = lookup.get(&row.name) else {
            logging::warn(Source::Arso, Some(&row.name), "Skipping station without coordinates");
            continue;
        };

        if !seen.insert(row.name.clone()) {
            logging::warn(Source::Arso, Some(&row.name), "Skipping duplicate station");
            continue;
        }

        let measurements = row.measurements(observed_at);
        logging::debug(
            Source::Arso,
            Some(&row.name),
            &format!(
                "Processed ({}) - Temp: {:?}°C, Level: {:?}cm, Flow: {:?}m³/s",
                row.river, measurements.temperature_c, measurements.water_level_cm, measurements.flow_m3s
            ),
        );

        records.push(StationRecord {
            river: Some(row.river).filter(|r| !r.is_empty()),
            name: row.name,
            coordinate,
            measurements,
        });
    }

    records
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
