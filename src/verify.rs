//! Coordinate Coverage Verification Module
//!
//! Checks the coordinate lookup against the stations currently listed on
//! the ARSO page: which stations will be published, which are dropped for
//! lack of a position, and which lookup entries no longer match anything.
//!
//! Run this after the page adds or renames stations, before regenerating
//! the geocoded coordinates file.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ingest::arso::HtmlSource;
use crate::ingest::extract::{station_rows, StationRow};
use crate::ingest::table::{select_data_table, TableSelectors};
use crate::model::{format_timestamp, ScrapeError};
use crate::pipeline::parse_document;
use crate::stations::CoordinateLookup;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub timestamp: String,
    pub status: VerificationStatus,
    pub table_rows: usize,
    pub matched: Vec<String>,
    pub missing_coordinates: Vec<String>,
    pub duplicates: Vec<String>,
    pub unused_coordinates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Coverage
// ============================================================================

/// Compares station rows from the table with the lookup.
pub fn coverage_from_rows(rows: &[StationRow], lookup: &CoordinateLookup) -> CoverageReport {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matched = Vec::new();
    let mut missing_coordinates = Vec::new();
    let mut duplicates = Vec::new();

    for row in rows {
        let name = row.name.as_str();
        if !seen.insert(name) {
            duplicates.push(name.to_string());
            continue;
        }
        if lookup.contains(name) {
            matched.push(name.to_string());
        } else {
            missing_coordinates.push(name.to_string());
        }
    }

    let unused_coordinates = lookup
        .names()
        .into_iter()
        .filter(|name| !seen.contains(name))
        .map(String::from)
        .collect();

    let status = if matched.is_empty() {
        VerificationStatus::Failed
    } else if missing_coordinates.is_empty() {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };

    CoverageReport {
        timestamp: format_timestamp(&Utc::now()),
        status,
        table_rows: rows.len(),
        matched,
        missing_coordinates,
        duplicates,
        unused_coordinates,
    }
}

/// Fetches the page and reports coordinate coverage of its station table.
pub fn verify_coverage(
    source: &dyn HtmlSource,
    url: &str,
    lookup: &CoordinateLookup,
) -> Result<CoverageReport, ScrapeError> {
    let markup = source.fetch(url)?;
    let document = parse_document(&markup)?;
    let selectors = TableSelectors::new()?;
    let table = select_data_table(&document, &selectors)?;
    let rows = station_rows(table, &selectors);
    Ok(coverage_from_rows(&rows, lookup))
}

pub fn print_summary(report: &CoverageReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("Coordinate coverage ({})", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    println!("  Status: {:?}", report.status);
    println!("  Station rows: {}", report.table_rows);
    println!("  Published: {}", report.matched.len());
    println!("  Missing coordinates: {}", report.missing_coordinates.len());
    for name in &report.missing_coordinates {
        println!("    ✗ {}", name);
    }
    if !report.duplicates.is_empty() {
        println!("  Duplicate rows: {}", report.duplicates.join(", "));
    }
    if !report.unused_coordinates.is_empty() {
        println!("  Unused lookup entries: {}", report.unused_coordinates.join(", "));
    }
    println!("═══════════════════════════════════════════════════════════\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    fn row(name: &str) -> StationRow {
        StationRow {
            river: "Sava".into(),
            name: name.into(),
            water_level: String::new(),
            flow: String::new(),
            trend: String::new(),
            temperature: String::new(),
        }
    }

    fn lookup(names: &[&str]) -> CoordinateLookup {
        names
            .iter()
            .map(|n| (n.to_string(), Coordinate { latitude: 46.0, longitude: 14.0 }))
            .collect()
    }

    #[test]
    fn test_full_coverage_is_success() {
        let report = coverage_from_rows(&[row("Litija"), row("Hrastnik")], &lookup(&["Litija", "Hrastnik"]));
        assert_eq!(report.status, VerificationStatus::Success);
        assert_eq!(report.matched, vec!["Litija", "Hrastnik"]);
        assert!(report.unused_coordinates.is_empty());
    }

    #[test]
    fn test_partial_coverage_lists_missing_and_unused() {
        let rows = [row("Litija"), row("Neznana"), row("Litija")];
        let report = coverage_from_rows(&rows, &lookup(&["Litija", "Ukinjena"]));

        assert_eq!(report.status, VerificationStatus::PartialSuccess);
        assert_eq!(report.table_rows, 3);
        assert_eq!(report.missing_coordinates, vec!["Neznana"]);
        assert_eq!(report.duplicates, vec!["Litija"]);
        assert_eq!(report.unused_coordinates, vec!["Ukinjena"]);
    }

    #[test]
    fn test_no_matches_is_failed() {
        let report = coverage_from_rows(&[row("Litija")], &CoordinateLookup::empty());
        assert_eq!(report.status, VerificationStatus::Failed);
    }
}
