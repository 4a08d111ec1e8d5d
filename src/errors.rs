// ABOUTME: Error types for the deck-loader library
// ABOUTME: Fatal failures of a load; per-slide problems are recorded as ParseError data instead

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote source: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("HTTP error {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid frontmatter: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Invalid import source: {0}")]
    InvalidImport(String),

    #[error("Invalid slide range: {0}")]
    InvalidRange(String),

    #[error("Preparser extension '{name}' failed: {message}")]
    ExtensionError { name: String, message: String },

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our DeckError
impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<notify::Error> for DeckError {
    fn from(err: notify::Error) -> Self {
        DeckError::WatchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
