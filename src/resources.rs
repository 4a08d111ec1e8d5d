// ABOUTME: Source resolution for the deck loader
// ABOUTME: Reads markdown from in-memory overrides, local files or remote URLs

use crate::errors::{DeckError, Result};
use crate::utils;
use log::{debug, info};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Where the loader gets markdown text from.
pub trait SourceReader {
    /// Return the text behind a normalized local path or a full URL.
    fn read(&self, path: &str) -> Result<String>;

    /// Whether a local import target can be read.
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

impl<F> SourceReader for F
where
    F: Fn(&str) -> Result<String>,
{
    fn read(&self, path: &str) -> Result<String> {
        self(path)
    }
}

/// Default source reader: overrides first, then remote fetch or local read.
#[derive(Debug, Clone)]
pub struct SourceFiles {
    overrides: HashMap<String, String>,
    timeout_ms: u64,
    retries: u32,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            timeout_ms: 10000,
            retries: 3,
        }
    }
}

impl SourceFiles {
    pub fn new(timeout_ms: u64, retries: u32) -> Self {
        Self {
            overrides: HashMap::new(),
            timeout_ms,
            retries: retries.max(1),
        }
    }

    /// Serve `content` for `path` instead of touching the disk or network.
    pub fn with_override(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert_override(path, content);
        self
    }

    pub fn insert_override(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.overrides.insert(path.into(), content.into());
    }

    /// Fetch content from a remote URL with retry capability
    fn fetch_remote(&self, url: &str) -> Result<String> {
        info!("Fetching remote markdown: {}", url);

        let client = Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()?;

        // Increasing backoff between attempts
        let mut retry_delay = 500;
        let mut last_error = None;

        for attempt in 1..=self.retries {
            match client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text()?);
                    }
                    last_error = Some(DeckError::HttpStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                    // Client errors will not improve on retry
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => last_error = Some(DeckError::FetchError(e)),
            }

            if attempt < self.retries {
                info!(
                    "Fetch attempt {} for {} failed, retrying in {} ms",
                    attempt, url, retry_delay
                );
                std::thread::sleep(Duration::from_millis(retry_delay));
                retry_delay *= 2;
            }
        }

        Err(last_error
            .unwrap_or_else(|| DeckError::ValidationError(format!("Unable to fetch {}", url))))
    }

    /// Read content from a local file
    fn read_local(&self, path: &str) -> Result<String> {
        debug!("Reading local markdown: {}", path);
        let path = Path::new(path);
        if !path.exists() {
            return Err(DeckError::PathNotFoundError(path.to_path_buf()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

impl SourceReader for SourceFiles {
    fn read(&self, path: &str) -> Result<String> {
        if let Some(content) = self.overrides.get(path) {
            debug!("Using in-memory source for {}", path);
            return Ok(content.clone());
        }
        if utils::is_remote(path) {
            self.fetch_remote(path)
        } else {
            self.read_local(path)
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.overrides.contains_key(path) || Path::new(path).exists()
    }
}
