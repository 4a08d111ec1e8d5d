use deck_loader::{load, save, Config, SourceFiles};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(path, content).expect("Failed to write fixture");
}

fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[test]
fn test_load_deck_from_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    write(
        root,
        "slides.md",
        "---\ntheme: default\n---\n\n# Intro\n\n---\nsrc: ./chapters/one.md\nclass: imported\n---\n\n---\nsrc: /shared/outro.md#2\n---\n",
    );
    write(
        root,
        "chapters/one.md",
        "# Chapter One\n\n---\n\n# Details\n\n---\nsrc: ../shared/outro.md#1\n---\n",
    );
    write(root, "shared/outro.md", "# Thanks\n\n---\n\n# Questions?\n");

    let reader = SourceFiles::default();
    let entry = root.join("slides.md");
    let deck = load(root, &entry.to_string_lossy(), &reader, None).expect("Failed to load deck");

    let titles: Vec<_> = deck
        .slides
        .iter()
        .map(|s| s.title.clone().unwrap_or_default())
        .collect();
    assert_eq!(
        titles,
        vec!["Intro", "Chapter One", "Details", "Thanks", "Questions?"]
    );

    // Imported slides carry the importer's override
    assert_eq!(deck.slides[1].frontmatter.get_str("class"), Some("imported"));
    assert_eq!(deck.slides[3].frontmatter.get_str("class"), Some("imported"));
    assert!(deck.slides[4].frontmatter.get_str("class").is_none());

    assert_eq!(deck.slides[3].import_chain.as_ref().map(Vec::len), Some(2));
    assert_eq!(deck.headmatter.get_str("theme"), Some("default"));
    assert_eq!(deck.headmatter.title(), Some("Intro"));

    // outro.md is imported twice but parsed once
    assert_eq!(deck.markdown_files.len(), 3);
    assert_eq!(deck.local_watch_paths().len(), 3);
    assert!(deck
        .watch_files
        .contains_key(&slash(&root.join("shared").join("outro.md"))));
    assert_eq!(deck.errors().count(), 0);
}

#[test]
fn test_missing_import_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "slides.md", "# A\n\n---\nsrc: nowhere.md\n---\n");

    let config = Config::new();
    let reader = config.source_files();
    let entry = root.join("slides.md");
    let deck = load(root, &entry.to_string_lossy(), &reader, None).expect("Failed to load deck");

    assert_eq!(deck.slides.len(), 1);
    let errors: Vec<_> = deck.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.message.contains("nowhere.md"));
}

#[test]
fn test_in_memory_override_takes_precedence() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "slides.md", "# On disk\n");

    let entry = slash(&root.join("slides.md"));
    let reader = SourceFiles::default().with_override(entry.clone(), "# In memory\n");
    let deck = load(root, &entry, &reader, None).expect("Failed to load deck");

    assert_eq!(deck.slides[0].title.as_deref(), Some("In memory"));
}

#[test]
fn test_save_after_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "slides.md", "# A\n\n---\nsrc: part.md\n---\n");
    write(root, "part.md", "# Part\n\n\n");

    let reader = SourceFiles::default();
    let entry = root.join("slides.md");
    let deck = load(root, &entry.to_string_lossy(), &reader, None).expect("Failed to load deck");

    let part_key = slash(&root.join("part.md"));
    let part = deck.markdown_files.get(&part_key).expect("part.md not loaded");
    let text = save(part).expect("Failed to save");

    assert_eq!(text, "# Part\n");
    assert_eq!(fs::read_to_string(root.join("part.md")).unwrap(), "# Part\n");
}
