use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_deck-loader"))
        .args(args)
        .env_remove("DECK_USER_ROOT")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_inspect_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    fs::write(
        temp_path.join("slides.md"),
        "# Opening\n\n---\nsrc: part.md\n---\n\n---\nsrc: missing.md\n---\n",
    )
    .expect("Failed to write markdown file");
    fs::write(temp_path.join("part.md"), "# Imported\n").expect("Failed to write markdown file");

    let entry = temp_path.join("slides.md");
    let output = run_command(&["inspect", entry.to_str().unwrap()]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Opening"), "Missing entry slide: {}", stdout);
    assert!(stdout.contains("Imported"), "Missing imported slide: {}", stdout);
    assert!(stdout.contains("(depth 1)"), "Missing import depth: {}", stdout);
    assert!(
        stdout.contains("Imported markdown file not found"),
        "Missing error report: {}",
        stdout
    );
}

#[test]
fn test_inspect_json_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();
    fs::write(temp_path.join("slides.md"), "---\ntheme: none\n---\n\n# Only\n")
        .expect("Failed to write markdown file");

    let entry = temp_path.join("slides.md");
    let output = run_command(&["inspect", entry.to_str().unwrap(), "--json"]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output is not JSON");
    assert_eq!(json["slides"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["headmatter"]["title"], "Only");
    assert_eq!(json["headmatter"]["theme"], "none");
}

#[test]
fn test_inspect_missing_entry_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let entry = temp_dir.path().join("absent.md");

    let output = run_command(&["inspect", entry.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_format_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("slides.md");
    fs::write(&path, "# A\n\n---\n\n# B\n\n\n\n").expect("Failed to write markdown file");

    let output = run_command(&["format", path.to_str().unwrap()]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(fs::read_to_string(&path).unwrap(), "# A\n\n---\n\n# B\n");
}
