// ABOUTME: Preparser extensions that rewrite markdown before and during parsing
// ABOUTME: Holds the process-global extension loader consulted once per load

use crate::errors::Result;
use crate::frontmatter::Frontmatter;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

/// Hook into the parser. Every method is optional.
pub trait PreparserExtension: Send + Sync {
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Rewrite the raw lines of a document before it is split into slides.
    fn transform_raw_lines(&self, _lines: &mut Vec<String>) -> Result<()> {
        Ok(())
    }

    /// Rewrite one parsed slide. Returning `Some` replaces the slide content.
    fn transform_slide(&self, _content: &str, _frontmatter: &mut Frontmatter) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Given the headmatter, the entry path and the mode, pick the extensions for one load.
pub type PreparserExtensionLoader = dyn Fn(&Frontmatter, &str, Option<&str>) -> Result<Vec<Arc<dyn PreparserExtension>>>
    + Send
    + Sync;

static EXTENSION_LOADER: Lazy<RwLock<Option<Arc<PreparserExtensionLoader>>>> =
    Lazy::new(|| RwLock::new(None));

/// Install the global extension loader, replacing any previous one.
pub fn inject_preparser_extension_loader<F>(loader: F)
where
    F: Fn(&Frontmatter, &str, Option<&str>) -> Result<Vec<Arc<dyn PreparserExtension>>>
        + Send
        + Sync
        + 'static,
{
    let loader: Arc<PreparserExtensionLoader> = Arc::new(loader);
    *EXTENSION_LOADER.write() = Some(loader);
}

pub fn clear_preparser_extension_loader() {
    *EXTENSION_LOADER.write() = None;
}

/// Extensions for a load of `filepath`; empty when no loader is installed.
///
/// The headmatter of `markdown` is only parsed when a loader is installed.
pub fn resolve_extensions(
    markdown: &str,
    filepath: &str,
    mode: Option<&str>,
) -> Result<Vec<Arc<dyn PreparserExtension>>> {
    // Clone the handle so the lock is not held while user code runs
    let loader = EXTENSION_LOADER.read().clone();
    match loader {
        Some(loader) => {
            let headmatter = extract_headmatter(markdown)?;
            let extensions = loader(&headmatter, filepath, mode)?;
            debug!(
                "Preparser extensions for {}: {:?}",
                filepath,
                extensions.iter().map(|e| e.name()).collect::<Vec<_>>()
            );
            Ok(extensions)
        }
        None => Ok(Vec::new()),
    }
}

/// Headmatter as seen by the extension loader: YAML up to the first closing fence.
pub fn extract_headmatter(markdown: &str) -> Result<Frontmatter> {
    let mut lines = markdown.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return Ok(Frontmatter::new()),
    }
    let mut yaml = String::new();
    for line in lines {
        if line.trim_end() == "---" {
            return Frontmatter::from_yaml_str(&yaml);
        }
        yaml.push_str(line);
        yaml.push('\n');
    }
    // No closing fence, no headmatter
    Ok(Frontmatter::new())
}
