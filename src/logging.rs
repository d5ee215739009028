/// Structured logging for the ARSO scrape service
///
/// Provides context-rich logging with station identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for scheduled runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::{ScrapeError, Snapshot};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Arso,
    Coordinates,
    Snapshot,
    Trigger,
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Arso => write!(f, "ARSO"),
            Source::Coordinates => write!(f, "COORD"),
            Source::Snapshot => write!(f, "SNAP"),
            Source::Trigger => write!(f, "TRIG"),
            Source::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - upstream site is down or slow, retry on next schedule
    Expected,
    /// Unexpected failure - page layout changed or local disk problem
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: &Source, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp,
            level,
            source,
            station_part,
            message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", source, station_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn with_logger(level: LogLevel, source: Source, station: Option<&str>, message: &str) {
    // Logging is a no-op until init_logger has run.
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, station, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: Source, station: Option<&str>, message: &str) {
    with_logger(LogLevel::Info, source, station, message);
}

/// Log a warning message
pub fn warn(source: Source, station: Option<&str>, message: &str) {
    with_logger(LogLevel::Warning, source, station, message);
}

/// Log an error message
pub fn error(source: Source, station: Option<&str>, message: &str) {
    with_logger(LogLevel::Error, source, station, message);
}

/// Log a debug message
pub fn debug(source: Source, station: Option<&str>, message: &str) {
    with_logger(LogLevel::Debug, source, station, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a failed scrape run by its error kind.
pub fn classify_scrape_failure(err: &ScrapeError) -> FailureType {
    match err {
        // ARSO has short outages; the next scheduled run usually succeeds
        ScrapeError::Fetch(_) => FailureType::Expected,
        ScrapeError::HttpStatus(code) if *code >= 500 => FailureType::Expected,
        ScrapeError::HttpStatus(_) => FailureType::Unknown,
        // Layout change on the page or a broken local filesystem
        ScrapeError::NoDataTableFound { .. } => FailureType::Unexpected,
        ScrapeError::Persistence(_) => FailureType::Unexpected,
        ScrapeError::ParseError(_) => FailureType::Unknown,
    }
}

/// Log a pipeline failure with automatic classification
pub fn log_pipeline_failure(stage: &str, err: &ScrapeError) {
    let failure_type = classify_scrape_failure(err);
    let message = format!("{} failed [{}]: {}", stage, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(Source::Arso, None, &message),
        FailureType::Unexpected => error(Source::Arso, None, &message),
        FailureType::Unknown => warn(Source::Arso, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Per-measurement coverage of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub stations: usize,
    pub with_temperature: usize,
    pub with_water_level: usize,
    pub with_flow: usize,
}

impl ScrapeSummary {
    pub fn of(snapshot: &Snapshot) -> Self {
        let stations = snapshot.stations();
        let count = |f: fn(&crate::model::Measurements) -> bool| {
            stations.iter().filter(|s| f(&s.measurements)).count()
        };
        ScrapeSummary {
            stations: stations.len(),
            with_temperature: count(|m| m.temperature_c.is_some()),
            with_water_level: count(|m| m.water_level_cm.is_some()),
            with_flow: count(|m| m.flow_m3s.is_some()),
        }
    }
}

/// Log a summary of a completed scrape
pub fn log_scrape_summary(snapshot: &Snapshot) {
    let summary = ScrapeSummary::of(snapshot);
    let message = format!(
        "Scrape complete: {} stations ({} with temperature, {} with water level, {} with flow)",
        summary.stations,
        summary.with_temperature,
        summary.with_water_level,
        summary.with_flow
    );

    if summary.stations == 0 {
        warn(Source::Snapshot, None, &message);
    } else {
        info(Source::Snapshot, None, &message);
    }
}
