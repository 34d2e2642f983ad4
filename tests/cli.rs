mod common;

use common::*;
use serde_json::json;
use std::fs;

#[test]
fn jsonl_session_renders_index_and_page() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("session.jsonl"),
        jsonl(&[
            prompt("2025-01-01T10:00:00Z", "Add a README"),
            reply("2025-01-01T10:00:05Z", "Done, see **README.md**."),
        ]),
    )
    .unwrap();

    let (code, stdout, stderr) = run_cli(dir.path(), &["session.jsonl", "-o", "site"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("Wrote 2 files"), "{stdout}");

    let out = dir.path().join("site");
    assert_eq!(listing(&out), ["index.html", "page-001.html"]);
    let page = fs::read_to_string(out.join("page-001.html")).unwrap();
    assert!(page.contains("Add a README"));
    assert!(page.contains("<strong>README.md</strong>"));
    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("page-001.html#msg-2025-01-01T10-00-00Z"));
}

#[test]
fn loglines_document_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({ "loglines": [
        prompt("2025-01-01T10:00:00Z", "hello"),
        { "type": "summary", "summary": "greeting" },
        reply("2025-01-01T10:00:01Z", "hi there"),
    ] });
    fs::write(dir.path().join("session.json"), doc.to_string()).unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.json"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let page = fs::read_to_string(dir.path().join("output/page-001.html")).unwrap();
    assert!(page.contains("hi there"));
}

#[test]
fn repo_flag_links_commits() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("session.jsonl"),
        jsonl(&[
            prompt("2025-01-01T10:00:00Z", "commit it"),
            tool_result("2025-01-01T10:00:02Z", "[main abc1234] Initial import"),
        ]),
    )
    .unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl", "--repo", "acme/widgets"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let page = fs::read_to_string(dir.path().join("output/page-001.html")).unwrap();
    assert!(page.contains("https://github.com/acme/widgets/commit/abc1234"), "{page}");
}

#[test]
fn malformed_repo_flag_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("session.jsonl"),
        jsonl(&[
            prompt("2025-01-01T10:00:00Z", "commit it"),
            tool_result("2025-01-01T10:00:02Z", "[main abc1234] Initial import"),
        ]),
    )
    .unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl", "--repo", "not a repo"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("owner/repo"), "{stderr}");
    let page = fs::read_to_string(dir.path().join("output/page-001.html")).unwrap();
    assert!(!page.contains("github.com"));
}

#[test]
fn settings_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("claudescroll.toml"),
        "repo = \"acme/gadgets\"\noutput_dir = \"rendered\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("session.jsonl"),
        jsonl(&[
            prompt("2025-01-01T10:00:00Z", "commit it"),
            tool_result("2025-01-01T10:00:02Z", "[main abc1234] Initial import"),
        ]),
    )
    .unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let page = fs::read_to_string(dir.path().join("rendered/page-001.html")).unwrap();
    assert!(page.contains("https://github.com/acme/gadgets/commit/abc1234"));

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl", "-o", "flag", "--repo", "acme/other"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let page = fs::read_to_string(dir.path().join("flag/page-001.html")).unwrap();
    assert!(page.contains("https://github.com/acme/other/commit/abc1234"));
}

#[test]
fn seven_prompts_make_two_pages() {
    let dir = tempfile::tempdir().unwrap();
    let entries: Vec<_> = (0..7)
        .map(|i| prompt(&format!("2025-01-01T10:0{i}:00Z"), &format!("prompt {i}")))
        .collect();
    fs::write(dir.path().join("session.jsonl"), jsonl(&entries)).unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        listing(&dir.path().join("output")),
        ["index.html", "page-001.html", "page-002.html"]
    );
}

#[test]
fn bad_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut contents = jsonl(&[prompt("2025-01-01T10:00:00Z", "survivor")]);
    contents.push_str("{ not json\n");
    contents.push_str("{\"type\": \"mystery\"}\n");
    fs::write(dir.path().join("session.jsonl"), contents).unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let page = fs::read_to_string(dir.path().join("output/page-001.html")).unwrap();
    assert!(page.contains("survivor"));
}

#[test]
fn missing_input_argument_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &[]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn nonexistent_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["nope.jsonl"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("claudescroll: "), "{stderr}");
    assert!(stderr.contains("nope.jsonl"));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn invalid_document_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("session.json"),
        json!({ "loglines": [{ "type": "mystery" }] }).to_string(),
    )
    .unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["session.json"]);
    assert_eq!(code, 1, "stderr: {stderr}");
    assert!(!dir.path().join("output").exists());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("session.jsonl"), jsonl(&[prompt("t", "hi")])).unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["session.jsonl", "--config", "absent.toml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("absent.toml"), "{stderr}");
}
