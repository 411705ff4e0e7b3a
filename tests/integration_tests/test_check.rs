// integration tests for the check command

use crate::common::*;
use serde_json::json;

#[test]
fn test_check_clean_rule_exits_zero() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "all",
        json!([{"id": "2", "type": "latest_release", "comparison": true}]),
    );
    let path = write_rule(dir.path(), "clean.json", &rule);

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ No conflicts"), "stdout: {}", stdout);
}

#[test]
fn test_check_new_issue_conflict_exits_three() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "all",
        json!([
            {"id": "2", "type": "issue_occurrences", "comparison": {"value": 5}},
            {"id": "3", "type": "latest_release", "comparison": true}
        ]),
    );
    let path = write_rule(dir.path(), "conflict.json", &rule);

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("conflict with \"A new issue is created.\""),
        "stdout: {}",
        stdout
    );
    assert!(stdout.contains("issue_occurrences#2"));
    assert!(!stdout.contains("latest_release#3"));
}

#[test]
fn test_check_json_output() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = json!({
        "triggers": {
            "id": "triggers",
            "logicType": "all",
            "conditions": [
                {"id": "1", "type": "first_seen_event"},
                {"id": "2", "type": "regression_event"}
            ]
        },
        "actionFilters": []
    });
    let path = write_rule(dir.path(), "exclusive.json", &rule);

    let output = run_ruleguard(&["--json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(3));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);

    let result = &lines[0]["result"];
    assert_eq!(lines[0]["jsonrpc"], "2.0");
    assert_eq!(result["conflict"], true);
    assert_eq!(
        result["conflictingConditionGroups"]["triggers"],
        json!(["1", "2"])
    );
    assert!(result["conflictReason"].is_string());
}

#[test]
fn test_check_json_clean_has_null_reason() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = json!({
        "triggers": {"id": "triggers", "logicType": "any-short", "conditions": []},
        "actionFilters": []
    });
    let path = write_rule(dir.path(), "empty.json", &rule);

    let output = run_ruleguard(&["--json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(0));
    let lines = json_lines(&output);
    assert_eq!(lines[0]["result"]["conflict"], false);
    assert!(lines[0]["result"]["conflictReason"].is_null());
    assert_eq!(lines[0]["result"]["conflictingConditionGroups"], json!({}));
}

#[test]
fn test_check_duplicate_triggers() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = json!({
        "triggers": {
            "id": "triggers",
            "logicType": "any-short",
            "conditions": [
                {"id": "1", "type": "reappeared_event"},
                {"id": "2", "type": "reappeared_event"}
            ]
        }
    });
    let path = write_rule(dir.path(), "dupes.json", &rule);

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Delete duplicate triggers to continue."));
}

#[test]
fn test_check_reads_stdin() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "any-short",
        json!([{"id": "2", "type": "event_frequency_count", "comparison": {"value": 100}}]),
    );

    let output = run_ruleguard_with_stdin(&["--json", "check"], &rule.to_string(), &config);

    assert_eq!(output.status.code(), Some(3));
    let lines = json_lines(&output);
    assert_eq!(lines[0]["result"]["source"], "-");
    assert_eq!(
        lines[0]["result"]["conflictingConditionGroups"]["actionFilter1"],
        json!(["2"])
    );
}

#[test]
fn test_check_accepts_json5() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let path = dir.path().join("rule.json5");
    std::fs::write(
        &path,
        r#"{
            // hand-written rule
            triggers: {id: 'triggers', logicType: 'all', conditions: [
                {id: '1', type: 'first_seen_event'},
            ]},
            actionFilters: [
                {id: 'af', logicType: 'all', conditions: [
                    {id: '2', type: 'age_comparison', comparison: {comparison_type: 'older', value: 3}},
                ]},
            ],
        }"#,
    )
    .unwrap();

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("age_comparison#2"), "stdout: {}", stdout);
}

#[test]
fn test_check_invalid_rule_exits_four() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not a rule").unwrap();

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {}", stderr);
}

#[test]
fn test_check_duplicate_ids_are_invalid() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = json!({
        "triggers": {
            "id": "triggers",
            "logicType": "all",
            "conditions": [
                {"id": "1", "type": "first_seen_event"},
                {"id": "1", "type": "new_high_priority_issue"}
            ]
        }
    });
    let path = write_rule(dir.path(), "ids.json", &rule);

    let output = run_ruleguard(&["--json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(4));
    let lines = json_lines(&output);
    assert_eq!(lines[0]["error"]["code"], -32004);
    assert!(lines[0]["error"]["data"]["details"].is_array());
}

#[test]
fn test_check_missing_file_is_an_error() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let missing = dir.path().join("missing.json");

    let output = run_ruleguard(&["--no-json", "check", missing.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read rule file"), "stderr: {}", stderr);
}

#[test]
fn test_check_multiple_files_keeps_going() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[]").unwrap();
    let clean = write_rule(
        dir.path(),
        "clean.json",
        &first_seen_rule("all", json!([])),
    );

    let output = run_ruleguard(
        &[
            "--json",
            "check",
            broken.to_str().unwrap(),
            clean.to_str().unwrap(),
        ],
        &config,
    );

    assert_eq!(output.status.code(), Some(4));
    let lines = json_lines(&output);
    // one error for the broken file, one result for the clean one, one summary error
    assert_eq!(lines.len(), 3);
    assert!(lines[0].get("error").is_some());
    assert_eq!(lines[1]["result"]["conflict"], false);
    assert!(lines[2].get("error").is_some());
}

#[test]
fn test_check_unknown_type_warns() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "all",
        json!([{"id": "2", "type": "latest_relase", "comparison": true}]),
    );
    let path = write_rule(dir.path(), "typo.json", &rule);

    let output = run_ruleguard(&["--json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(0));
    let lines = json_lines(&output);
    let warnings = lines[0]["result"]["warnings"].as_array().unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.as_str().unwrap().contains("did you mean 'latest_release'")));
}

#[test]
fn test_check_fail_on_unknown_types_from_config() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"settings": {"fail_on_unknown_types": true}}"#).unwrap();
    let rule = first_seen_rule(
        "all",
        json!([{"id": "2", "type": "latest_relase", "comparison": true}]),
    );
    let path = write_rule(dir.path(), "typo.json", &rule);

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown condition types"), "stderr: {}", stderr);
}

#[test]
fn test_check_precedence_flag() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "all",
        json!([
            {"id": "2", "type": "issue_priority_greater_or_equal", "comparison": {"value": 75}},
            {"id": "3", "type": "issue_priority_deescalating"},
            {"id": "4", "type": "issue_occurrences", "comparison": {"value": 10}}
        ]),
    );
    let path = write_rule(dir.path(), "both.json", &rule);
    let path = path.to_str().unwrap();

    let default = run_ruleguard(&["--json", "check", path], &config);
    assert_eq!(default.status.code(), Some(3));
    let reason = json_lines(&default)[0]["result"]["conflictReason"].clone();
    assert!(reason.as_str().unwrap().contains("A new issue is created."));

    let pair_first = run_ruleguard(
        &["--json", "check", "--precedence", "incompatible-pair-first", path],
        &config,
    );
    assert_eq!(pair_first.status.code(), Some(3));
    assert_eq!(
        json_lines(&pair_first)[0]["result"]["conflictReason"],
        "The issue priority conditions highlighted in red are in conflict."
    );
}

#[test]
fn test_check_quiet_reports_reason_on_stderr() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = first_seen_rule(
        "all",
        json!([{"id": "2", "type": "issue_occurrences", "comparison": {"value": 5}}]),
    );
    let path = write_rule(dir.path(), "conflict.json", &rule);

    let output = run_ruleguard(&["--quiet", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("A new issue is created."));
}

#[test]
fn test_check_invalid_config_exits_five() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ settings: ").unwrap();
    let path = write_rule(dir.path(), "clean.json", &first_seen_rule("all", json!([])));

    let output = run_ruleguard(&["--no-json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_check_filter_reusing_trigger_group_id_is_invalid() {
    let dir = create_test_dir();
    let config = dir.path().join("config.json");
    let rule = json!({
        "triggers": {
            "id": "g",
            "logicType": "all",
            "conditions": [{"id": "1", "type": "first_seen_event"}]
        },
        "actionFilters": [
            {"id": "g", "logicType": "all", "conditions": [
                {"id": "2", "type": "issue_occurrences", "comparison": {"value": 5}}
            ]}
        ]
    });
    let path = write_rule(dir.path(), "shared_id.json", &rule);

    let output = run_ruleguard(&["--json", "check", path.to_str().unwrap()], &config);

    assert_eq!(output.status.code(), Some(4));
    let lines = json_lines(&output);
    let details = lines[0]["error"]["data"]["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|d| d.as_str().unwrap().contains("duplicate group id 'g'")));
}
