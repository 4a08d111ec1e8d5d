// ABOUTME: Recursive deck loader: resolves `src` slide imports into one flat slide list
// ABOUTME: Tracks per-file documents, import provenance and the files to watch

use crate::errors::{DeckError, Result};
use crate::features::{detect_features, FeatureSet};
use crate::frontmatter::{Frontmatter, FrontmatterValue};
use crate::parser::{parse, stringify, ParseError, SlideRef, SlidevMarkdown, SourceSlideInfo};
use crate::preparser::{self, PreparserExtension};
use crate::range::parse_range_string;
use crate::resources::SourceReader;
use crate::utils;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A slide of the final deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideInfo {
    /// Position in the deck
    pub index: usize,
    pub frontmatter: Frontmatter,
    pub content: String,
    pub revision: String,
    pub frontmatter_raw: Option<String>,
    pub note: Option<String>,
    pub title: Option<String>,
    pub level: Option<u8>,
    /// Import directives that led here, outermost first. `None` for entry slides.
    pub import_chain: Option<Vec<SlideRef>>,
    /// The raw slide this one was produced from
    pub source: SlideRef,
}

/// Result of loading a deck.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedDeck {
    pub slides: Vec<SlideInfo>,
    /// Key of the entry document in `markdown_files`
    pub entry: String,
    pub headmatter: Frontmatter,
    pub features: FeatureSet,
    pub markdown_files: IndexMap<String, SlidevMarkdown>,
    pub watch_files: IndexMap<String, BTreeSet<usize>>,
}

impl LoadedDeck {
    pub fn entry(&self) -> Option<&SlidevMarkdown> {
        self.markdown_files.get(&self.entry)
    }

    pub fn source_slide(&self, slide: &SlideRef) -> Option<&SourceSlideInfo> {
        self.markdown_files
            .get(&slide.filepath)
            .and_then(|md| md.slides.get(slide.index))
    }

    /// Every recorded error with the document it belongs to.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &ParseError)> {
        self.markdown_files
            .iter()
            .flat_map(|(path, md)| md.errors.iter().map(move |e| (path.as_str(), e)))
    }

    pub fn local_watch_paths(&self) -> Vec<PathBuf> {
        self.watch_files
            .keys()
            .filter(|path| !utils::is_remote(path))
            .map(PathBuf::from)
            .collect()
    }
}

/// State shared by the document loader and the slide resolver during one load.
struct LoadContext<'a> {
    user_root: &'a Path,
    reader: &'a dyn SourceReader,
    extensions: Vec<Arc<dyn PreparserExtension>>,
    markdown_files: IndexMap<String, SlidevMarkdown>,
    watch_files: IndexMap<String, BTreeSet<usize>>,
    slides: Vec<SlideInfo>,
}

impl<'a> LoadContext<'a> {
    fn new(
        user_root: &'a Path,
        reader: &'a dyn SourceReader,
        extensions: Vec<Arc<dyn PreparserExtension>>,
    ) -> Self {
        Self {
            user_root,
            reader,
            extensions,
            markdown_files: IndexMap::new(),
            watch_files: IndexMap::new(),
            slides: Vec::new(),
        }
    }

    /// Parse and memoize `path` unless it is already known.
    fn ensure_document(&mut self, path: &str, markdown: Option<String>) -> Result<()> {
        if self.markdown_files.contains_key(path) {
            return Ok(());
        }
        let markdown = match markdown {
            Some(markdown) => markdown,
            None => self.reader.read(path)?,
        };
        let md = parse(&markdown, path, &self.extensions)?;
        info!("Loaded {} ({} slides)", path, md.slides.len());
        self.markdown_files.insert(path.to_string(), md);
        self.watch_files.insert(path.to_string(), BTreeSet::new());
        Ok(())
    }

    fn document(&self, path: &str) -> Result<&SlidevMarkdown> {
        self.markdown_files
            .get(path)
            .ok_or_else(|| DeckError::ValidationError(format!("Document not loaded: {}", path)))
    }

    fn document_mut(&mut self, path: &str) -> Result<&mut SlidevMarkdown> {
        self.markdown_files
            .get_mut(path)
            .ok_or_else(|| DeckError::ValidationError(format!("Document not loaded: {}", path)))
    }

    fn record_error(&mut self, slide: &SourceSlideInfo, message: String) -> Result<()> {
        warn!("{} (line {}): {}", slide.filepath, slide.start, message);
        self.document_mut(&slide.filepath)?
            .record_error(slide.start, message);
        Ok(())
    }

    /// Load `path` and resolve the slides selected by `range`.
    fn load_markdown(
        &mut self,
        path: &str,
        range: Option<&str>,
        frontmatter_override: Option<&Frontmatter>,
        importers: &[SlideRef],
    ) -> Result<()> {
        self.ensure_document(path, None)?;

        let total = self.document(path)?.slides.len();
        for index in parse_range_string(total, range)? {
            let slide = self.document(path)?.slides[index - 1].clone();

            // One bad slide must not abort its siblings
            if let Err(e) = self.load_slide(&slide, frontmatter_override, importers) {
                self.record_error(&slide, format!("Error when loading slide: {}", e))?;
                continue;
            }

            if let Some(importer) = importers.last() {
                let importing = self
                    .document_mut(&importer.filepath)?
                    .slides
                    .get_mut(importer.index);
                if let Some(importing) = importing {
                    importing
                        .imports
                        .get_or_insert_with(Vec::new)
                        .push(slide.slide_ref());
                }
            }
        }
        Ok(())
    }

    /// Emit `slide`, or follow it when it imports another file.
    fn load_slide(
        &mut self,
        slide: &SourceSlideInfo,
        frontmatter_override: Option<&Frontmatter>,
        import_chain: &[SlideRef],
    ) -> Result<()> {
        if slide.frontmatter.is_skipped() {
            debug!("Skipping disabled slide {}#{}", slide.filepath, slide.index + 1);
            return Ok(());
        }

        let src = match slide.frontmatter.src() {
            Some(FrontmatterValue::String(src)) => src,
            Some(other) => {
                return Err(DeckError::InvalidImport(format!(
                    "src must be a string, got {:?}",
                    other
                )))
            }
            None => {
                self.emit(slide, frontmatter_override, import_chain);
                return Ok(());
            }
        };

        let (raw_path, range) = match src.split_once('#') {
            Some((raw_path, range)) => (raw_path, Some(range)),
            None => (src.as_str(), None),
        };
        let path = utils::resolve_import_path(self.user_root, &slide.filepath, raw_path)?;

        let mut merged = slide.frontmatter.merged(frontmatter_override);
        merged.remove("src");

        let this = slide.slide_ref();
        if import_chain.contains(&this) {
            return self.record_error(slide, format!("Circular import detected: {}", path));
        }
        if !utils::is_remote(&path) && !self.reader.exists(&path) {
            return self.record_error(slide, format!("Imported markdown file not found: {}", path));
        }

        debug!(
            "Importing {}{} from {}#{}",
            path,
            range.map(|r| format!("#{}", r)).unwrap_or_default(),
            slide.filepath,
            slide.index + 1
        );
        let mut chain = import_chain.to_vec();
        chain.push(this);
        self.load_markdown(&path, range, Some(&merged), &chain)
    }

    fn emit(
        &mut self,
        slide: &SourceSlideInfo,
        frontmatter_override: Option<&Frontmatter>,
        import_chain: &[SlideRef],
    ) {
        let index = self.slides.len();
        debug!("Slide {} <- {}#{}", index, slide.filepath, slide.index + 1);
        self.slides.push(SlideInfo {
            index,
            frontmatter: slide.frontmatter.merged(frontmatter_override),
            content: slide.content.clone(),
            revision: slide.revision.clone(),
            frontmatter_raw: slide.frontmatter_raw.clone(),
            note: slide.note.clone(),
            title: slide.title.clone(),
            level: slide.level,
            import_chain: if import_chain.is_empty() {
                None
            } else {
                Some(import_chain.to_vec())
            },
            source: slide.slide_ref(),
        });
    }
}

fn entry_key(filepath: &str) -> Result<String> {
    if utils::is_remote(filepath) {
        Ok(filepath.to_string())
    } else {
        utils::normalize_path(Path::new(filepath))
    }
}

/// Load the deck rooted at `filepath`, following every `src` import.
///
/// Only failures to read or parse the entry document are returned as errors;
/// problems below it are recorded on the documents and the load carries on.
pub fn load(
    user_root: &Path,
    filepath: &str,
    reader: &dyn SourceReader,
    mode: Option<&str>,
) -> Result<LoadedDeck> {
    let entry = entry_key(filepath)?;
    info!("Loading deck from {}", entry);

    let markdown = reader.read(&entry)?;
    let extensions = preparser::resolve_extensions(&markdown, &entry, mode)?;

    let mut ctx = LoadContext::new(user_root, reader, extensions);
    ctx.ensure_document(&entry, Some(markdown))?;
    ctx.load_markdown(&entry, None, None, &[])?;

    let LoadContext {
        slides,
        markdown_files,
        watch_files,
        ..
    } = ctx;

    let mut headmatter = markdown_files
        .get(&entry)
        .and_then(|md| md.slides.first())
        .map(|slide| slide.frontmatter.clone())
        .unwrap_or_default();
    if let Some(title) = slides.first().and_then(|slide| slide.title.as_deref()) {
        let missing = matches!(headmatter.get("title"), None | Some(FrontmatterValue::Null));
        if missing {
            headmatter.insert("title", title);
        }
    }

    let raw: String = slides
        .iter()
        .filter_map(|slide| {
            markdown_files
                .get(&slide.source.filepath)
                .and_then(|md| md.slides.get(slide.source.index))
        })
        .map(|source| source.raw.as_str())
        .collect();
    let features = detect_features(&raw);

    info!(
        "Loaded deck {}: {} slides from {} files",
        entry,
        slides.len(),
        markdown_files.len()
    );

    Ok(LoadedDeck {
        slides,
        entry,
        headmatter,
        features,
        markdown_files,
        watch_files,
    })
}

/// Read and parse a single document without following imports.
pub fn load_document(
    filepath: &str,
    reader: &dyn SourceReader,
    mode: Option<&str>,
) -> Result<SlidevMarkdown> {
    let path = entry_key(filepath)?;
    let markdown = reader.read(&path)?;
    let extensions = preparser::resolve_extensions(&markdown, &path, mode)?;
    parse(&markdown, &path, &extensions)
}

/// Serialize `markdown` and write it back to its file. Remote documents are only serialized.
pub fn save(markdown: &SlidevMarkdown) -> Result<String> {
    let text = stringify(markdown);
    if utils::is_remote(&markdown.filepath) {
        debug!("Not writing remote document {}", markdown.filepath);
        return Ok(text);
    }

    let path = Path::new(&markdown.filepath);
    utils::ensure_parent_directory_exists(path)?;
    fs::write(path, &text)?;
    info!("Saved {}", markdown.filepath);
    Ok(text)
}
