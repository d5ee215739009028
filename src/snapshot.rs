//! Persisting the snapshot document.
//!
//! Every write replaces the whole file. The JSON is written to a sibling
//! `.tmp` file first and renamed into place, so the map front-end polling
//! the file never reads a truncated document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::logging::{self, Source};
use crate::model::{ScrapeError, Snapshot, StationRecord};

/// Wraps the extracted records into a snapshot stamped `now`.
pub fn build_snapshot(records: Vec<StationRecord>, now: DateTime<Utc>) -> Snapshot {
    Snapshot::new(records, now)
}

/// Serializes `snapshot` as pretty-printed JSON (2-space indent).
pub fn to_json(snapshot: &Snapshot) -> Result<String, ScrapeError> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| ScrapeError::Persistence(format!("could not serialize snapshot: {}", e)))
}

/// Writes `snapshot` as the complete new content of `destination`.
pub fn write_snapshot(snapshot: &Snapshot, destination: &Path) -> Result<(), ScrapeError> {
    let json = to_json(snapshot)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence(parent, e))?;
    }

    let tmp = temp_path(destination);
    let result = write_file(&tmp, json.as_bytes()).and_then(|_| fs::rename(&tmp, destination));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(persistence(destination, e));
    }

    logging::info(
        Source::Snapshot,
        None,
        &format!(
            "Data saved to {} ({} stations)",
            destination.display(),
            snapshot.station_count()
        ),
    );
    Ok(())
}

/// Reads a previously written snapshot back.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, ScrapeError> {
    let text = fs::read_to_string(path).map_err(|e| persistence(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| ScrapeError::Persistence(format!("{} is not a snapshot: {}", path.display(), e)))
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

fn persistence(path: &Path, e: std::io::Error) -> ScrapeError {
    ScrapeError::Persistence(format!("{}: {}", path.display(), e))
}
