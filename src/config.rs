// ABOUTME: Configuration module for the deck-loader library
// ABOUTME: Provides configuration settings and environment variable handling

use crate::resources::SourceFiles;
use crate::watch::WatchConfig;
use std::env;
use std::path::PathBuf;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Root that `src: /x.md` imports resolve against
    pub user_root: PathBuf,
    pub mode: Option<String>,
    pub fetch_timeout_ms: u64,
    pub fetch_retries: u32,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_root: PathBuf::from("."),
            mode: None,
            fetch_timeout_ms: 10000, // 10 seconds
            fetch_retries: 3,
            debounce_ms: 500,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let user_root = env::var("DECK_USER_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.user_root);
        let mode = env::var("DECK_MODE").ok().filter(|s| !s.is_empty());
        let fetch_timeout_ms = env::var("FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.fetch_timeout_ms);
        let fetch_retries = env::var("FETCH_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.fetch_retries);
        let debounce_ms = env::var("WATCH_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.debounce_ms);

        Self {
            user_root,
            mode,
            fetch_timeout_ms,
            fetch_retries,
            debounce_ms,
        }
    }

    /// Get a source reader with the fetch settings from this config
    pub fn source_files(&self) -> SourceFiles {
        SourceFiles::new(self.fetch_timeout_ms, self.fetch_retries)
    }

    /// Get a watch configuration with defaults from this config
    pub fn watch_config(&self, entry: PathBuf, debounce_ms: Option<u64>) -> WatchConfig {
        WatchConfig {
            entry,
            user_root: self.user_root.clone(),
            mode: self.mode.clone(),
            debounce_ms: debounce_ms.unwrap_or(self.debounce_ms),
        }
    }
}
