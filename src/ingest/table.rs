//! Locating the station table on the ARSO page.
//!
//! The page carries several tables (layout, legend, the station table)
//! and none of them has a reliable `id` or `class`. The station table is
//! identified by structural fingerprint instead:
//!
//! 1. more than [`MIN_TABLE_ROWS`] rows,
//! 2. a first row mentioning both [`HEADER_WATER_LEVEL`] and
//!    [`HEADER_TEMPERATURE`],
//! 3. a row at index 2 with at least [`MIN_DATA_CELLS`] `td` cells.
//!
//! The first table in document order passing all three wins.

use scraper::{ElementRef, Html, Selector};

use crate::logging::{self, Source};
use crate::model::ScrapeError;

/// Tables with this many rows or fewer are decorative.
pub const MIN_TABLE_ROWS: usize = 10;

/// Cells a data row needs to cover every mapped column.
pub const MIN_DATA_CELLS: usize = 6;

/// Index of the first data row; rows 0 and 1 are headers.
pub const FIRST_DATA_ROW: usize = 2;

/// Header token for "water level".
pub const HEADER_WATER_LEVEL: &str = "Vodostaj";

/// Header token for "temperature".
pub const HEADER_TEMPERATURE: &str = "Temperatura";

const DIAGNOSTIC_HEADER_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Compiled CSS selectors shared by table selection and row extraction.
pub struct TableSelectors {
    pub table: Selector,
    pub row: Selector,
    pub cell: Selector,
    pub header_cell: Selector,
}

impl TableSelectors {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(TableSelectors {
            table: compile("table")?,
            row: compile("tr")?,
            cell: compile("td")?,
            header_cell: compile("td, th")?,
        })
    }
}

fn compile(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::ParseError(format!("invalid selector '{}': {:?}", css, e)))
}

// ---------------------------------------------------------------------------
// Row and cell access
// ---------------------------------------------------------------------------

/// All `tr` elements under `table`, in document order.
pub fn table_rows<'a>(table: ElementRef<'a>, selectors: &TableSelectors) -> Vec<ElementRef<'a>> {
    table.select(&selectors.row).collect()
}

/// Trimmed text of every `td` cell in `row`.
pub fn cell_texts(row: ElementRef<'_>, selectors: &TableSelectors) -> Vec<String> {
    row.select(&selectors.cell)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn header_text(row: ElementRef<'_>, selectors: &TableSelectors) -> String {
    row.select(&selectors.header_cell)
        .map(|cell| cell.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Returns `true` if `table` carries the station data fingerprint.
pub fn is_data_table(table: ElementRef<'_>, selectors: &TableSelectors) -> bool {
    let rows = table_rows(table, selectors);
    if rows.len() <= MIN_TABLE_ROWS {
        return false;
    }

    let header = header_text(rows[0], selectors);
    if !(header.contains(HEADER_WATER_LEVEL) && header.contains(HEADER_TEMPERATURE)) {
        return false;
    }

    rows.get(FIRST_DATA_ROW)
        .map(|row| row.select(&selectors.cell).count() >= MIN_DATA_CELLS)
        .unwrap_or(false)
}

/// Picks the station table out of `document`.
///
/// Fails with [`ScrapeError::NoDataTableFound`] when no table qualifies;
/// the error lists each candidate's leading header text so a layout
/// change on the page can be diagnosed from the log alone.
pub fn select_data_table<'a>(
    document: &'a Html,
    selectors: &TableSelectors,
) -> Result<ElementRef<'a>, ScrapeError> {
    if let Some(table) = document
        .select(&selectors.table)
        .find(|table| is_data_table(*table, selectors))
    {
        return Ok(table);
    }

    let candidates = describe_tables(document, selectors);
    logging::warn(
        Source::Arso,
        None,
        &format!("Could not find data table. Available tables: {}", candidates.len()),
    );
    for candidate in &candidates {
        logging::warn(Source::Arso, None, candidate);
    }

    Err(ScrapeError::NoDataTableFound { candidates })
}

/// One line per table: index and truncated first-row text.
fn describe_tables(document: &Html, selectors: &TableSelectors) -> Vec<String> {
    document
        .select(&selectors.table)
        .enumerate()
        .map(|(i, table)| {
            let first_row = table
                .select(&selectors.row)
                .next()
                .map(|row| row.text().collect::<String>())
                .unwrap_or_default();
            let squashed = first_row.split_whitespace().collect::<Vec<_>>().join(" ");
            let truncated: String = squashed.chars().take(DIAGNOSTIC_HEADER_CHARS).collect();
            format!("Table {}: {}...", i, truncated)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::{data_row, station_table, table_with_header};

    fn select_from(html: &str) -> Result<usize, ScrapeError> {
        let document = Html::parse_document(html);
        let selectors = TableSelectors::new().unwrap();
        let chosen = select_data_table(&document, &selectors)?;
        let index = document
            .select(&selectors.table)
            .position(|t| t.id() == chosen.id())
            .unwrap();
        Ok(index)
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| data_row(&["Sava", &format!("Postaja {}", i), "100", "10", "", "9"]))
            .collect()
    }

    #[test]
    fn test_selects_qualifying_table_after_decoys() {
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            station_table(&rows(3)),                                          // 5 rows: too small
            table_with_header(&["Legenda", "Opis", "", "", "", ""], &rows(18)), // no header tokens
            station_table(&rows(18)),                                         // qualifies
        );
        assert_eq!(select_from(&html), Ok(2));
    }

    #[test]
    fn test_first_qualifying_table_wins() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            station_table(&rows(12)),
            station_table(&rows(20)),
        );
        assert_eq!(select_from(&html), Ok(0));
    }

    #[test]
    fn test_exactly_threshold_rows_is_rejected() {
        // 2 header rows + 8 data rows = 10 rows, which is not > 10
        let html = format!("<html><body>{}</body></html>", station_table(&rows(8)));
        assert!(matches!(select_from(&html), Err(ScrapeError::NoDataTableFound { .. })));

        let html = format!("<html><body>{}</body></html>", station_table(&rows(9)));
        assert_eq!(select_from(&html), Ok(0));
    }

    #[test]
    fn test_short_sample_row_is_rejected() {
        let mut body = vec![data_row(&["Sava", "Litija", "100"])];
        body.extend(rows(15));
        let html = format!("<html><body>{}</body></html>", station_table(&body));
        assert!(matches!(select_from(&html), Err(ScrapeError::NoDataTableFound { .. })));
    }

    #[test]
    fn test_no_table_reports_candidates() {
        let html = format!(
            "<html><body>{}<table><tr><td>Navigacija</td></tr></table></body></html>",
            station_table(&rows(2)),
        );
        match select_from(&html) {
            Err(ScrapeError::NoDataTableFound { candidates }) => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].starts_with("Table 0: "));
                assert!(candidates[0].contains(HEADER_WATER_LEVEL));
                assert_eq!(candidates[1], "Table 1: Navigacija...");
            }
            other => panic!("expected NoDataTableFound, got {:?}", other),
        }
    }

    #[test]
    fn test_page_without_tables_fails() {
        let html = "<html><body><p>Vzdrževanje</p></body></html>";
        match select_from(html) {
            Err(ScrapeError::NoDataTableFound { candidates }) => assert!(candidates.is_empty()),
            other => panic!("expected NoDataTableFound, got {:?}", other),
        }
    }
}
