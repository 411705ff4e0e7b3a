// integration tests for the types and completions commands

use crate::common::*;

#[test]
fn test_types_text_lists_known_types() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");

    let output = run_ruleguard(&["--no-json", "types"], &config);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("first_seen_event"));
    assert!(stdout.contains("incompatible with issue_priority_greater_or_equal"));
    assert!(stdout.contains("always false for new issues"));
}

#[test]
fn test_types_json_filtered_by_role() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");

    let output = run_ruleguard(&["--json", "types", "--role", "trigger"], &config);

    assert!(output.status.success());
    let lines = json_lines(&output);
    let rows = lines[0]["result"].as_array().unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r["role"] == "trigger"));
    assert!(rows
        .iter()
        .any(|r| r["name"] == "first_seen_event" && r["description"] == "A new issue is created."));
}

#[test]
fn test_completions_bash() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");

    let output = run_ruleguard(&["completions", "bash"], &config);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ruleguard"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_completions_invalid_shell() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");

    let output = run_ruleguard(&["completions", "tcsh"], &config);

    assert!(!output.status.success());
}
