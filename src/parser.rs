// ABOUTME: Markdown deck parser: splits raw text into slides with frontmatter
// ABOUTME: Also serializes a parsed document back to text

use crate::errors::{DeckError, Result};
use crate::frontmatter::Frontmatter;
use crate::preparser::PreparserExtension;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

static NOTE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());

/// Stable handle to a raw slide: owning file plus zero-based position in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SlideRef {
    pub filepath: String,
    pub index: usize,
}

/// How a slide's frontmatter was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontmatterStyle {
    /// `---` fenced block
    Frontmatter,
    /// leading ```yaml code block
    Yaml,
}

/// A recorded, non-fatal problem in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    /// Zero-based line the problem is attributed to
    pub row: usize,
    pub message: String,
}

/// A slide as written in its source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSlideInfo {
    pub filepath: String,
    pub index: usize,
    pub start: usize,
    pub content_start: usize,
    pub end: usize,
    pub raw: String,
    pub content: String,
    pub frontmatter: Frontmatter,
    pub frontmatter_raw: Option<String>,
    pub frontmatter_style: Option<FrontmatterStyle>,
    pub note: Option<String>,
    pub title: Option<String>,
    pub level: Option<u8>,
    pub revision: String,
    /// Slides this slide expanded into when it is an import directive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<SlideRef>>,
}

impl SourceSlideInfo {
    pub fn slide_ref(&self) -> SlideRef {
        SlideRef {
            filepath: self.filepath.clone(),
            index: self.index,
        }
    }
}

/// A parsed markdown file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlidevMarkdown {
    pub filepath: String,
    pub raw: String,
    pub slides: Vec<SourceSlideInfo>,
    pub errors: Vec<ParseError>,
}

impl SlidevMarkdown {
    pub fn record_error(&mut self, row: usize, message: impl Into<String>) {
        self.errors.push(ParseError {
            row,
            message: message.into(),
        });
    }
}

struct SlideParts {
    content: String,
    frontmatter_raw: Option<String>,
    frontmatter_style: Option<FrontmatterStyle>,
    note: Option<String>,
}

/// Parse markdown text into slides.
pub fn parse(
    markdown: &str,
    filepath: &str,
    extensions: &[Arc<dyn PreparserExtension>],
) -> Result<SlidevMarkdown> {
    let mut lines: Vec<String> = markdown
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    for extension in extensions {
        extension
            .transform_raw_lines(&mut lines)
            .map_err(|e| extension_error(extension.as_ref(), e))?;
    }

    let mut doc = SlidevMarkdown {
        filepath: filepath.to_string(),
        raw: markdown.to_string(),
        slides: Vec::new(),
        errors: Vec::new(),
    };

    let mut start = 0;
    let mut content_start = 0;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();
        if line.starts_with("---") {
            if start != i {
                push_slide(&mut doc, &lines, start, content_start, i, extensions)?;
            }
            start = i + 1;
            content_start = i + 1;

            let opens_frontmatter = line.as_bytes().get(3) != Some(&b'-')
                && lines.get(i + 1).map_or(false, |next| !next.trim().is_empty());
            if opens_frontmatter {
                start = i;
                i += 1;
                while i < lines.len() && lines[i].trim_end() != "---" {
                    i += 1;
                }
                content_start = i + 1;
            }
        } else if line.trim_start().starts_with("```") {
            let fence_len = line.len() - line.trim_start().trim_start_matches('`').len();
            let fence = &line[..fence_len];
            if let Some(offset) = lines[i + 1..].iter().position(|l| l.starts_with(fence)) {
                i += offset + 1;
            }
        }
        i += 1;
    }
    if start < lines.len() {
        push_slide(&mut doc, &lines, start, content_start, lines.len(), extensions)?;
    }

    Ok(doc)
}

fn push_slide(
    doc: &mut SlidevMarkdown,
    lines: &[String],
    start: usize,
    content_start: usize,
    end: usize,
    extensions: &[Arc<dyn PreparserExtension>],
) -> Result<()> {
    let raw = lines[start..end].join("\n");
    let parts = split_slide(&raw);

    let mut frontmatter = match &parts.frontmatter_raw {
        Some(yaml) => match Frontmatter::from_yaml_str(yaml) {
            Ok(frontmatter) => frontmatter,
            Err(e) => {
                doc.record_error(start, format!("Invalid frontmatter: {}", e));
                Frontmatter::new()
            }
        },
        None => Frontmatter::new(),
    };

    let mut content = parts.content;
    for extension in extensions {
        let rewritten = extension
            .transform_slide(&content, &mut frontmatter)
            .map_err(|e| extension_error(extension.as_ref(), e))?;
        if let Some(rewritten) = rewritten {
            content = rewritten;
        }
    }

    let (title, level) = slide_title(&frontmatter, &content);
    let index = doc.slides.len();
    doc.slides.push(SourceSlideInfo {
        filepath: doc.filepath.clone(),
        index,
        start,
        content_start,
        end,
        revision: revision_of(&raw),
        raw,
        content,
        frontmatter,
        frontmatter_raw: parts.frontmatter_raw,
        frontmatter_style: parts.frontmatter_style,
        note: parts.note,
        title,
        level,
        imports: None,
    });
    Ok(())
}

fn extension_error(extension: &dyn PreparserExtension, err: DeckError) -> DeckError {
    DeckError::ExtensionError {
        name: extension.name().to_string(),
        message: err.to_string(),
    }
}

/// Byte offsets of the first line that is exactly `---`, and of the text after it.
fn closing_fence(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((offset, offset + line.trim_end_matches(['\r', '\n']).len()));
        }
        offset += line.len();
    }
    None
}

/// Split a slide's raw text into frontmatter, content and speaker note.
fn split_slide(raw: &str) -> SlideParts {
    let mut frontmatter_raw = None;
    let mut frontmatter_style = None;
    let mut body = raw;

    if raw.starts_with("---") {
        // The opening fence line may carry trailing text
        if let Some(newline) = raw.find('\n') {
            let rest = &raw[newline + 1..];
            if let Some((close, after)) = closing_fence(rest) {
                frontmatter_raw = Some(rest[..close].to_string());
                frontmatter_style = Some(FrontmatterStyle::Frontmatter);
                body = &rest[after..];
            }
        }
    } else {
        let trimmed = raw.trim_start();
        let lang = trimmed
            .strip_prefix("```yaml")
            .or_else(|| trimmed.strip_prefix("```yml"))
            // The info string must be exactly the language tag
            .filter(|after| after.starts_with(char::is_whitespace));
        if let Some(after) = lang {
            if let Some(close) = after.find("```") {
                frontmatter_raw = Some(after[..close].trim_start_matches('\n').to_string());
                frontmatter_style = Some(FrontmatterStyle::Yaml);
                body = &after[close + 3..];
            }
        }
    }

    let mut content = body.trim().to_string();
    let mut note = None;
    let last_comment = NOTE_COMMENT.captures_iter(&content).last().and_then(|caps| {
        let whole = caps.get(0)?;
        Some((whole.start(), whole.end(), caps.get(1)?.as_str().trim().to_string()))
    });
    if let Some((from, to, text)) = last_comment {
        // Only a comment closing the slide is a speaker note
        if content[to..].trim().is_empty() {
            note = Some(text);
            content = content[..from].trim().to_string();
        }
    }

    SlideParts {
        content,
        frontmatter_raw,
        frontmatter_style,
        note,
    }
}

/// Title from frontmatter, falling back to the first heading of the content.
fn slide_title(frontmatter: &Frontmatter, content: &str) -> (Option<String>, Option<u8>) {
    let named = frontmatter
        .get_str("title")
        .or_else(|| frontmatter.get_str("name"));
    if let Some(title) = named {
        let level = frontmatter
            .get("level")
            .and_then(|v| v.as_i64())
            .and_then(|l| u8::try_from(l).ok())
            .unwrap_or(1);
        return (Some(title.to_string()), Some(level));
    }

    let arena = Arena::new();
    let root = parse_document(&arena, content, &ComrakOptions::default());
    for node in root.descendants() {
        let level = match &node.data.borrow().value {
            NodeValue::Heading(heading) => heading.level,
            _ => continue,
        };
        let mut text = String::new();
        collect_text(node, &mut text);
        let text = text.trim().to_string();
        if !text.is_empty() {
            return (Some(text), Some(level));
        }
    }
    (None, None)
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => collect_text(child, out),
        }
    }
}

fn revision_of(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(&digest[..6])
}

/// Serialize a document back to markdown text.
pub fn stringify(markdown: &SlidevMarkdown) -> String {
    let body = markdown
        .slides
        .iter()
        .enumerate()
        .map(|(idx, slide)| {
            if idx == 0 || slide.raw.starts_with("---") {
                slide.raw.clone()
            } else if slide.raw.starts_with('\n') {
                format!("---\n{}", slide.raw)
            } else {
                // Keep a blank line so the separator is not read as a frontmatter fence
                format!("---\n\n{}", slide.raw)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n", body.trim())
}
