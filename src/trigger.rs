//! "Run now" invocation surface for schedulers and HTTP triggers.
//!
//! The response mirrors a small JSON API: 200 with the station count on
//! success, 500 with the error message on failure, 405 for anything but
//! `GET`. The caller owns the actual HTTP server (if any).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::arso::HtmlSource;
use crate::logging::{self, Source};
use crate::model::format_timestamp;
use crate::pipeline::ScrapePipeline;

pub const SUCCESS_MESSAGE: &str = "ARSO data updated successfully";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpdateBody {
    Success {
        success: bool,
        timestamp: String,
        #[serde(rename = "stationCount")]
        station_count: usize,
        message: String,
    },
    Failure {
        success: bool,
        error: String,
        timestamp: String,
    },
    Rejected {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: UpdateBody,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn body_json(&self) -> String {
        // UpdateBody holds only strings, numbers and bools
        serde_json::to_string_pretty(&self.body).unwrap_or_default()
    }
}

/// Handles one update request using the current time.
pub fn handle_update(method: &str, pipeline: &mut ScrapePipeline, source: &dyn HtmlSource) -> TriggerResponse {
    handle_update_at(method, pipeline, source, Utc::now())
}

pub fn handle_update_at(
    method: &str,
    pipeline: &mut ScrapePipeline,
    source: &dyn HtmlSource,
    now: DateTime<Utc>,
) -> TriggerResponse {
    if !method.eq_ignore_ascii_case("GET") {
        logging::warn(Source::Trigger, None, &format!("Rejected {} request", method));
        return TriggerResponse {
            status: 405,
            body: UpdateBody::Rejected {
                error: "Method not allowed".to_string(),
            },
        };
    }

    logging::info(Source::Trigger, None, "Starting ARSO data scrape...");
    match pipeline.run_at(source, now) {
        Ok(snapshot) => TriggerResponse {
            status: 200,
            body: UpdateBody::Success {
                success: true,
                timestamp: format_timestamp(&now),
                station_count: snapshot.station_count(),
                message: SUCCESS_MESSAGE.to_string(),
            },
        },
        Err(e) => TriggerResponse {
            status: 500,
            body: UpdateBody::Failure {
                success: false,
                error: e.to_string(),
                timestamp: format_timestamp(&now),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev_mode::StaticSource;
    use crate::stations::CoordinateLookup;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_non_get_is_rejected_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = ScrapePipeline::new("u", dir.path().join("out.json"), CoordinateLookup::empty());

        let response = handle_update_at("POST", &mut pipeline, &StaticSource::new(""), fixed_now());

        assert_eq!(response.status, 405);
        let json: serde_json::Value = serde_json::from_str(&response.body_json()).unwrap();
        assert_eq!(json["error"], "Method not allowed");
        assert_eq!(pipeline.state(), crate::pipeline::PipelineState::Idle);
    }

    #[test]
    fn test_failure_reports_message_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = ScrapePipeline::new("u", dir.path().join("out.json"), CoordinateLookup::empty());

        let response = handle_update_at("get", &mut pipeline, &StaticSource::new("<p>x</p>"), fixed_now());

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        let json: serde_json::Value = serde_json::from_str(&response.body_json()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Could not find the main data table (0 candidates)");
        assert_eq!(json["timestamp"], "2025-06-01T08:30:00.000Z");
    }
}
