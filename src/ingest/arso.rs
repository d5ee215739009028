/// ARSO (Slovenian Environment Agency) page client
///
/// Retrieves the automatic water-station status page. The page is plain
/// HTML with no API behind it; everything downstream works on the raw
/// markup returned here.
///
/// Page: https://www.arso.gov.si/vode/podatki/stanje_voda_samodejne.html

use std::time::Duration;

use crate::config::ServiceConfig;
use crate::logging::{self, Source};
use crate::model::ScrapeError;

pub const ARSO_URL: &str = "https://www.arso.gov.si/vode/podatki/stanje_voda_samodejne.html";

/// The site rejects requests without a browser-like user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ============================================================================
// Transport seam
// ============================================================================

/// Anything that can hand back the markup found at a URL.
pub trait HtmlSource {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

impl HtmlSource for reqwest::blocking::Client {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .get(url)
            .send()
            .map_err(|e| ScrapeError::Fetch(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ScrapeError::HttpStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| ScrapeError::Fetch(format!("could not read response body: {}", e)))?;

        logging::debug(
            Source::Arso,
            None,
            &format!("Received {} characters of HTML", body.len()),
        );
        Ok(body)
    }
}

// ============================================================================
// Client construction
// ============================================================================

/// Builds the blocking HTTP client used for the ARSO page.
pub fn build_client(config: &ServiceConfig) -> Result<reqwest::blocking::Client, ScrapeError> {
    reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| ScrapeError::Fetch(format!("could not build HTTP client: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================
