//! Golden file tests for assistant reply parsing.
//!
//! Each case in `fixtures/replies/` is a JSON file holding a raw assistant
//! reply and either the expected recipe or the expected error message:
//!
//! ```json
//! { "reply": "Title: ...", "expected": { "title": "...", ... } }
//! { "reply": "Sorry...", "error": "Recipe is missing required fields: ..." }
//! ```

use glob::glob;
use pirate_core::{parse_recipe, StructuredRecipe};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct TestCase {
    reply: String,
    #[serde(default)]
    expected: Option<StructuredRecipe>,
    #[serde(default)]
    error: Option<String>,
}

fn load_test_cases() -> Vec<(String, TestCase)> {
    let pattern = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/replies/*.json");

    let mut cases = Vec::new();
    for entry in glob(&pattern.to_string_lossy()).expect("Failed to read glob pattern") {
        let path = entry.expect("Failed to read directory entry");
        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
        let case: TestCase = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
        cases.push((name, case));
    }

    cases.sort_by(|a, b| a.0.cmp(&b.0));
    cases
}

#[test]
fn test_reply_golden_files() {
    let cases = load_test_cases();
    assert!(!cases.is_empty(), "no reply fixtures found");

    let mut failures = Vec::new();

    for (name, case) in &cases {
        let actual = parse_recipe(&case.reply);
        let ok = match (&case.expected, &case.error, &actual) {
            (Some(expected), None, Ok(recipe)) => expected == recipe,
            (None, Some(message), Err(e)) => *message == e.to_string(),
            _ => false,
        };
        if !ok {
            failures.push(format!(
                "\n=== {} ===\nExpected: {:#?}\nExpected error: {:?}\nActual: {:#?}\n",
                name, case.expected, case.error, actual
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} failures across {} cases:\n{}",
            failures.len(),
            cases.len(),
            failures.concat()
        );
    }
}

/// Every successfully parsed fixture survives a render and re-parse unchanged.
#[test]
fn test_template_text_reparses() {
    for (name, case) in load_test_cases() {
        let Some(expected) = case.expected else {
            continue;
        };
        let reparsed = parse_recipe(&expected.to_template_text())
            .unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert_eq!(reparsed, expected, "{}", name);
    }
}
