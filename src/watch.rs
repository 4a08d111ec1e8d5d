// ABOUTME: Watch module for monitoring the source files of a deck
// ABOUTME: Reloads the deck whenever the entry file or an imported file changes

use log::{debug, error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, Debouncer, FileIdMap};

use crate::config::Config as AppConfig;
use crate::errors::{DeckError, Result};
use crate::loader::{self, LoadedDeck};
use crate::resources::SourceFiles;
use crate::utils;

/// Configuration for watch mode
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Entry markdown file of the deck
    pub entry: PathBuf,

    /// Root for `/`-prefixed imports
    pub user_root: PathBuf,

    /// Mode handed to preparser extension loaders
    pub mode: Option<String>,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::new(),
            user_root: PathBuf::from("."),
            mode: None,
            debounce_ms: 500,
        }
    }
}

type DeckDebouncer = Debouncer<RecommendedWatcher, FileIdMap>;

/// Load the deck, then reload it every time one of its local source files changes.
///
/// `on_reload` sees the initial deck and every successful reload. Failing
/// reloads are logged and the previous deck stays current. Blocks until the
/// watcher shuts down.
pub fn watch_deck<F>(config: &WatchConfig, app_config: &AppConfig, mut on_reload: F) -> Result<()>
where
    F: FnMut(&LoadedDeck),
{
    let entry = utils::normalize_path(&config.entry)?;
    let reader = app_config.source_files();

    // Initial load
    let mut deck = load_deck(config, &entry, &reader)?;
    on_reload(&deck);

    // Create a channel to receive file system events
    let (tx, rx) = mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| DeckError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    let mut watched_dirs = HashSet::new();
    watch_source_dirs(&mut debouncer, &deck, &mut watched_dirs)?;

    println!(
        "Watching {} source files of {} (Press Ctrl+C to stop)",
        deck.local_watch_paths().len(),
        entry
    );

    let mut last_processed = Instant::now();

    for result in rx {
        match result {
            Ok(events) => {
                let relevant_changes = events.iter().any(|event| {
                    event.paths.iter().any(|path| {
                        let relevant = is_relevant_path(path, &deck);
                        if relevant {
                            debug!("Detected relevant change in {:?}", path);
                        }
                        relevant
                    })
                });

                let now = Instant::now();
                if relevant_changes
                    && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms)
                {
                    match load_deck(config, &entry, &reader) {
                        Ok(reloaded) => {
                            info!("Reloaded deck: {} slides", reloaded.slides.len());
                            if let Err(e) =
                                watch_source_dirs(&mut debouncer, &reloaded, &mut watched_dirs)
                            {
                                error!("Failed to watch new source files: {}", e);
                            }
                            on_reload(&reloaded);
                            deck = reloaded;
                            last_processed = now;
                        }
                        Err(e) => error!("Failed to reload deck: {}", e),
                    }
                }
            }
            Err(errors) => error!("Watch error: {:?}", errors),
        }
    }

    Ok(())
}

fn load_deck(config: &WatchConfig, entry: &str, reader: &SourceFiles) -> Result<LoadedDeck> {
    loader::load(&config.user_root, entry, reader, config.mode.as_deref())
}

/// Watch the directory of every local watch file not covered yet
fn watch_source_dirs(
    debouncer: &mut DeckDebouncer,
    deck: &LoadedDeck,
    watched_dirs: &mut HashSet<PathBuf>,
) -> Result<()> {
    for path in deck.local_watch_paths() {
        let dir = utils::watch_dir(&path).to_path_buf();
        if watched_dirs.contains(&dir) {
            continue;
        }
        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                DeckError::WatchError(format!("Failed to start watching {:?}: {}", dir, e))
            })?;
        info!("Watching for changes in {:?}", dir);
        watched_dirs.insert(dir);
    }
    Ok(())
}

/// Checks if a changed path is one of the deck's source files
pub(crate) fn is_relevant_path(path: &Path, deck: &LoadedDeck) -> bool {
    let normalized = match utils::normalize_path(path) {
        Ok(p) => p,
        Err(_) => return false,
    };
    if deck.watch_files.contains_key(&normalized) {
        return true;
    }

    // Event paths may come back canonicalized (e.g. through symlinked temp dirs)
    let canonical = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(_) => return false,
    };
    deck.local_watch_paths().iter().any(|source| {
        std::fs::canonicalize(source)
            .map(|s| s == canonical)
            .unwrap_or(false)
    })
}
