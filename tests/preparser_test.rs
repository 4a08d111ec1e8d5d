// Installs the process-global extension loader, so it lives in its own test binary.

use deck_loader::{
    clear_preparser_extension_loader, inject_preparser_extension_loader, load, Frontmatter,
    PreparserExtension, Result, SourceFiles,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

struct Shout;

impl PreparserExtension for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn transform_raw_lines(&self, lines: &mut Vec<String>) -> Result<()> {
        for line in lines.iter_mut() {
            if line.starts_with("# ") {
                *line = line.to_uppercase();
            }
        }
        Ok(())
    }

    fn transform_slide(&self, content: &str, frontmatter: &mut Frontmatter) -> Result<Option<String>> {
        frontmatter.insert("shouted", true);
        Ok(Some(format!("{}!", content)))
    }
}

#[test]
fn test_extensions_apply_to_every_document() {
    let seen: Arc<Mutex<Vec<(Option<String>, String, Option<String>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    inject_preparser_extension_loader(move |headmatter, filepath, mode| {
        recorder.lock().unwrap().push((
            headmatter.get_str("addons").map(str::to_string),
            filepath.to_string(),
            mode.map(str::to_string),
        ));
        let extensions: Vec<Arc<dyn PreparserExtension>> = if headmatter.contains_key("addons") {
            vec![Arc::new(Shout)]
        } else {
            Vec::new()
        };
        Ok(extensions)
    });

    let reader = SourceFiles::default()
        .with_override("/deck/A.md", "---\naddons: shout\n---\n\n# hello\n\n---\nsrc: B.md\n---\n")
        .with_override("/deck/B.md", "# world\n");
    let deck = load(Path::new("/deck"), "/deck/A.md", &reader, Some("dev")).unwrap();

    let contents: Vec<&str> = deck.slides.iter().map(|s| s.content.as_str()).collect();
    assert_eq!(contents, vec!["# HELLO!", "# WORLD!"]);
    assert!(deck.slides.iter().all(|s| s.frontmatter.is_truthy("shouted")));

    let calls = seen.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            Some("shout".to_string()),
            "/deck/A.md".to_string(),
            Some("dev".to_string())
        )]
    );

    clear_preparser_extension_loader();
    let deck = load(Path::new("/deck"), "/deck/A.md", &reader, None).unwrap();
    assert_eq!(deck.slides[0].content, "# hello");
}
