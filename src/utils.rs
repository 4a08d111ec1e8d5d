// ABOUTME: Utility functions for the deck-loader library
// ABOUTME: Path normalization, import target resolution and directory helpers

use crate::errors::{DeckError, Result};
use path_absolutize::Absolutize;
use std::path::Path;
use url::Url;

/// Whether `path` is an http(s) URL rather than a local path.
pub fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Forward-slash form of a path, stable across platforms.
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Absolute, lexically normalized, forward-slash form of a local path.
pub fn normalize_path(path: &Path) -> Result<String> {
    let absolute = path.absolutize().map_err(|e| {
        DeckError::ValidationError(format!("Failed to resolve path {:?}: {}", path, e))
    })?;
    Ok(slash(&absolute))
}

/// Resolve the path part of a `src` value as seen from the slide owning it.
///
/// URLs are kept verbatim, `/x` is relative to the project root and anything
/// else is relative to the directory of `importer` (a path or a URL).
pub fn resolve_import_path(user_root: &Path, importer: &str, target: &str) -> Result<String> {
    if is_remote(target) {
        return Ok(target.to_string());
    }
    if let Some(rooted) = target.strip_prefix('/') {
        return normalize_path(&user_root.join(rooted));
    }
    if is_remote(importer) {
        let base = Url::parse(importer)
            .map_err(|e| DeckError::InvalidImport(format!("{}: {}", importer, e)))?;
        let joined = base
            .join(target)
            .map_err(|e| DeckError::InvalidImport(format!("{} from {}: {}", target, importer, e)))?;
        return Ok(joined.to_string());
    }
    let dir = Path::new(importer).parent().unwrap_or(Path::new("."));
    normalize_path(&dir.join(target))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory_exists(parent),
        _ => Ok(()),
    }
}

/// Directory to watch for changes to `path`
pub fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        // If no parent (just a filename) or empty parent, use current directory
        _ => Path::new("."),
    }
}
