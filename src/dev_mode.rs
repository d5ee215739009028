/// Development mode sources for working without the live ARSO site
///
/// When the live page is unavailable (or to replay a page that broke
/// parsing), point the pipeline at a saved copy of the HTML instead of
/// the network client.

use std::path::{Path, PathBuf};

use crate::ingest::arso::HtmlSource;
use crate::logging::{self, Source};
use crate::model::ScrapeError;

/// Serves a saved ARSO page from disk, ignoring the requested URL.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source replaying the page saved at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl HtmlSource for FileSource {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        logging::info(
            Source::Arso,
            None,
            &format!("Offline mode: reading {} instead of {}", self.path.display(), url),
        );
        std::fs::read_to_string(&self.path)
            .map_err(|e| ScrapeError::Fetch(format!("{}: {}", self.path.display(), e)))
    }
}

/// Serves fixed in-memory markup.
pub struct StaticSource {
    markup: String,
}

impl StaticSource {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

impl HtmlSource for StaticSource {
    fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
        Ok(self.markup.clone())
    }
}
