/// ARSO page ingestion.
///
/// Submodules:
/// - `arso`    — the transport seam (`HtmlSource`) and the HTTP client.
/// - `table`   — finds the station table among the page's tables.
/// - `extract` — turns table rows into `StationRecord`s.

pub mod arso;
pub mod extract;
pub mod table;
