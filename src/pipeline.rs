//! Scrape pipeline: fetch → parse → extract → write.
//!
//! One run walks the states
//!
//! ```text
//! Idle → Fetching → Parsing → Extracting → Writing → Done
//!            └──────────┴──────────┴───────────┴──→ Failed
//! ```
//!
//! strictly in order. Any error moves the run to `Failed` and is returned
//! to the caller; nothing is retried and no partial snapshot is written.
//! Re-running is the scheduler's job.
//!
//! # Clock injection
//! `run_at` takes the capture time as a parameter; `run` uses the real
//! current time. Tests use `run_at` to stay deterministic.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::config::ServiceConfig;
use crate::ingest::arso::HtmlSource;
use crate::ingest::extract::extract_stations;
use crate::ingest::table::{select_data_table, TableSelectors};
use crate::logging::{self, Source};
use crate::model::{ScrapeError, Snapshot};
use crate::snapshot::{build_snapshot, write_snapshot};
use crate::stations::CoordinateLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Parsing,
    Extracting,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Fetching => "fetching",
            PipelineState::Parsing => "parsing",
            PipelineState::Extracting => "extracting",
            PipelineState::Writing => "writing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Turns raw markup into a document. Blank markup is the one input
/// html5ever cannot make anything of.
pub fn parse_document(markup: &str) -> Result<Html, ScrapeError> {
    if markup.trim().is_empty() {
        return Err(ScrapeError::ParseError("page body is empty".to_string()));
    }
    Ok(Html::parse_document(markup))
}

pub struct ScrapePipeline {
    source_url: String,
    output_path: PathBuf,
    lookup: CoordinateLookup,
    state: PipelineState,
}

impl ScrapePipeline {
    pub fn new(source_url: impl Into<String>, output_path: impl Into<PathBuf>, lookup: CoordinateLookup) -> Self {
        ScrapePipeline {
            source_url: source_url.into(),
            output_path: output_path.into(),
            lookup,
            state: PipelineState::Idle,
        }
    }

    pub fn from_config(config: &ServiceConfig, lookup: CoordinateLookup) -> Self {
        Self::new(config.source_url.clone(), config.output_path.clone(), lookup)
    }

    /// State reached by the most recent run (`Idle` before the first).
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the pipeline once, stamping records with the current time.
    pub fn run(&mut self, source: &dyn HtmlSource) -> Result<Snapshot, ScrapeError> {
        self.run_at(source, Utc::now())
    }

    /// Runs the pipeline once with an explicit capture time.
    pub fn run_at(&mut self, source: &dyn HtmlSource, now: DateTime<Utc>) -> Result<Snapshot, ScrapeError> {
        match self.execute(source, now) {
            Ok(snapshot) => {
                self.transition(PipelineState::Done);
                logging::log_scrape_summary(&snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                let stage = self.state.to_string();
                self.transition(PipelineState::Failed);
                logging::log_pipeline_failure(&stage, &e);
                Err(e)
            }
        }
    }

    fn execute(&mut self, source: &dyn HtmlSource, now: DateTime<Utc>) -> Result<Snapshot, ScrapeError> {
        self.transition(PipelineState::Fetching);
        logging::info(Source::Arso, None, &format!("Fetching data from {}", self.source_url));
        let markup = source.fetch(&self.source_url)?;

        self.transition(PipelineState::Parsing);
        let document = parse_document(&markup)?;

        self.transition(PipelineState::Extracting);
        let selectors = TableSelectors::new()?;
        let table = select_data_table(&document, &selectors)?;
        let records = extract_stations(table, &selectors, &self.lookup, now);

        self.transition(PipelineState::Writing);
        let snapshot = build_snapshot(records, now);
        write_snapshot(&snapshot, &self.output_path)?;

        Ok(snapshot)
    }

    fn transition(&mut self, next: PipelineState) {
        logging::debug(Source::System, None, &format!("pipeline {} -> {}", self.state, next));
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev_mode::StaticSource;
    use crate::ingest::fixtures::{data_row, station_table};
    use crate::model::Coordinate;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    struct FailingSource(ScrapeError);

    impl HtmlSource for FailingSource {
        fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
            Err(self.0.clone())
        }
    }

    fn page(rows: usize) -> String {
        let rows: Vec<_> = (0..rows)
            .map(|i| data_row(&["Sava", &format!("Postaja {}", i), "100,5", "10", "", "9,1"]))
            .collect();
        format!("<html><body>{}</body></html>", station_table(&rows))
    }

    fn lookup() -> CoordinateLookup {
        (0..20)
            .map(|i| (format!("Postaja {}", i), Coordinate { latitude: 46.0, longitude: 14.0 }))
            .collect()
    }

    #[test]
    fn test_successful_run_ends_done_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("arso-latest.json");
        let mut pipeline = ScrapePipeline::new("https://example.test/", &out, lookup());
        assert_eq!(pipeline.state(), PipelineState::Idle);

        let snap = pipeline.run_at(&StaticSource::new(page(12)), fixed_now()).unwrap();

        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(snap.station_count(), 12);
        assert_eq!(snap.last_updated(), fixed_now());
        assert!(out.exists());
    }

    #[test]
    fn test_fetch_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("arso-latest.json");
        let mut pipeline = ScrapePipeline::new("https://example.test/", &out, lookup());

        let err = pipeline.run(&FailingSource(ScrapeError::HttpStatus(503))).unwrap_err();

        assert_eq!(err, ScrapeError::HttpStatus(503));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(!out.exists());
    }

    #[test]
    fn test_empty_markup_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = ScrapePipeline::new("u", dir.path().join("out.json"), lookup());
        let err = pipeline.run(&StaticSource::new("  \n ")).unwrap_err();
        assert!(matches!(err, ScrapeError::ParseError(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_write_failure_ends_failed() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the snapshot file should go
        let out = dir.path().join("arso-latest.json");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("keep"), "x").unwrap();
        let mut pipeline = ScrapePipeline::new("u", &out, lookup());

        let err = pipeline.run(&StaticSource::new(page(12))).unwrap_err();

        assert!(matches!(err, ScrapeError::Persistence(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(out.is_dir());
    }

    #[test]
    fn test_missing_table_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("arso-latest.json");
        std::fs::write(&out, "previous").unwrap();
        let mut pipeline = ScrapePipeline::new("u", &out, lookup());

        let err = pipeline.run(&StaticSource::new(page(3))).unwrap_err();

        assert!(matches!(err, ScrapeError::NoDataTableFound { .. }));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous");
    }

    #[test]
    fn test_pipeline_can_run_again_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = ScrapePipeline::new("u", dir.path().join("out.json"), lookup());

        assert!(pipeline.run(&StaticSource::new("")).is_err());
        assert!(pipeline.run(&StaticSource::new(page(15))).is_ok());
        assert_eq!(pipeline.state(), PipelineState::Done);
    }
}
