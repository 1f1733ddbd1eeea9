use std::path::Path;
use std::process::{Command, Output};

fn doclink_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_doclink"));
    cmd.arg("--root").arg(root);
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    return std::fs::read_to_string(root.join(relative)).unwrap();
}

fn stderr(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stderr).into_owned();
}

fn stdout(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stdout).into_owned();
}

/// `guide/` with one link written before `02-start.md` was renamed.
fn renamed_guide() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "guide/01-intro.md",
        "# Intro\n\nNext: [Getting Started](02-start.md)\n",
    );
    write(dir.path(), "guide/02-getting-started.md", "# Getting Started\n");
    write(dir.path(), "README.md", "See [the intro](guide/01-intro.md).\n");
    return dir;
}

#[test]
fn check_passes_on_clean_tree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "README.md", "[Setup](guide/setup.md) and [web](https://example.com)\n");
    write(dir.path(), "guide/setup.md", "[Back](../README.md#top) [here](#install)\n");

    let output = doclink_cmd(dir.path()).arg("check").output().unwrap();
    assert!(output.status.success(), "check failed: {}", stderr(&output));
    assert!(stdout(&output).contains("All 4 links valid across 2 files"));
}

#[test]
fn check_fails_on_broken_link_and_writes_nothing() {
    let dir = renamed_guide();

    let output = doclink_cmd(dir.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("guide/01-intro.md:3"), "unexpected output: {out}");
    assert!(out.contains("guide/02-start.md"));
    assert!(!dir.path().join("link_audit_results.json").exists());
}

#[test]
fn check_json_reports_broken_link_fields() {
    let dir = renamed_guide();

    let output = doclink_cmd(dir.path()).args(["check", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total_files"], 3);
    assert_eq!(json["summary"]["broken_links"], 1);
    let broken = &json["broken_links"][0];
    assert_eq!(broken["source_file"], "guide/01-intro.md");
    assert_eq!(broken["line"], 3);
    assert_eq!(broken["url"], "02-start.md");
    assert_eq!(broken["target"], "guide/02-start.md");
    assert_eq!(broken["type"], "internal");
    assert_eq!(broken["status"], "broken");
}

#[test]
fn audit_writes_reports_that_do_not_count_as_documents() {
    let dir = renamed_guide();

    let first = doclink_cmd(dir.path()).arg("audit").output().unwrap();
    assert_eq!(first.status.code(), Some(1));
    assert!(dir.path().join("LINK_AUDIT_REPORT.md").exists());
    assert!(read(dir.path(), "LINK_AUDIT_REPORT.md").contains("02-start.md"));

    let second = doclink_cmd(dir.path()).args(["check", "--json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(json["summary"]["total_files"], 3);
}

#[test]
fn fix_rewrites_renamed_sibling_and_is_idempotent() {
    let dir = renamed_guide();

    let output = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert!(output.status.success(), "fix failed: {}", stderr(&output));
    assert_eq!(
        read(dir.path(), "guide/01-intro.md"),
        "# Intro\n\nNext: [Getting Started](./02-getting-started.md)\n"
    );

    let report: serde_json::Value = serde_json::from_str(&read(dir.path(), "link_fix_results.json")).unwrap();
    assert_eq!(report["summary"]["total_fixes_made"], 1);
    assert_eq!(report["files_fixed"][0]["fixes"][0]["corrected_url"], "./02-getting-started.md");

    let again = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert!(again.status.success());
    let report: serde_json::Value = serde_json::from_str(&read(dir.path(), "link_fix_results.json")).unwrap();
    assert_eq!(report["summary"]["total_fixes_made"], 0);
}

#[test]
fn fix_reports_ambiguous_file_name_without_guessing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.md", "[Readme](readme.md)\n");
    write(dir.path(), "x/readme.md", "");
    write(dir.path(), "y/readme.md", "");

    let output = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(read(dir.path(), "index.md"), "[Readme](readme.md)\n");

    let report: serde_json::Value = serde_json::from_str(&read(dir.path(), "link_fix_results.json")).unwrap();
    assert_eq!(report["summary"]["total_fixes_made"], 0);
    assert_eq!(report["unfixable_links"][0]["reason"], "ambiguous: 2 candidates");
}

#[test]
fn alias_repair_preserves_anchor() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "README.md", "Read [x](old.md#section) first.\n");
    write(dir.path(), "new.md", "## Section\n");

    let add = doclink_cmd(dir.path()).args(["alias", "add", "old.md", "new.md"]).output().unwrap();
    assert!(add.status.success(), "alias add failed: {}", stderr(&add));

    let list = doclink_cmd(dir.path()).args(["alias", "list"]).output().unwrap();
    assert!(stdout(&list).contains("old.md -> new.md"));

    let output = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert!(output.status.success(), "fix failed: {}", stderr(&output));
    assert_eq!(read(dir.path(), "README.md"), "Read [x](new.md#section) first.\n");
}

#[test]
fn alias_remove_unknown_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = doclink_cmd(dir.path()).args(["alias", "remove", "old.md"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn fix_from_missing_report_is_an_error() {
    let dir = renamed_guide();

    let output = doclink_cmd(dir.path()).args(["fix", "--from-report"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("doclink audit"), "unexpected: {}", stderr(&output));
    assert!(read(dir.path(), "guide/01-intro.md").contains("(02-start.md)"));
}

#[test]
fn fix_from_report_uses_persisted_audit() {
    let dir = renamed_guide();

    let audit = doclink_cmd(dir.path()).arg("audit").output().unwrap();
    assert_eq!(audit.status.code(), Some(1));

    let output = doclink_cmd(dir.path()).args(["fix", "--from-report"]).output().unwrap();
    assert!(output.status.success(), "fix failed: {}", stderr(&output));
    assert!(read(dir.path(), "guide/01-intro.md").contains("(./02-getting-started.md)"));
}

#[test]
fn missing_root_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = doclink_cmd(&dir.path().join("nope")).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn info_json_lists_report_files() {
    let dir = tempfile::tempdir().unwrap();

    let output = doclink_cmd(dir.path()).args(["info", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["current_state"]["config_found"], false);
    assert!(json["reports"].as_array().unwrap().iter().any(|r| r == "link_audit_results.json"));
}

#[test]
fn target_with_spaces_resolves_whole() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.md", "[n](My Notes.md) and [t](My Notes.md \"Notes\")\n");
    write(dir.path(), "My Notes.md", "");

    let output = doclink_cmd(dir.path()).args(["check", "--json"]).output().unwrap();
    assert!(output.status.success(), "check failed: {}", stdout(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["valid_links"], 2);
}

#[test]
fn fix_into_name_with_spaces_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.md", "[n](notes.md)\n");
    write(dir.path(), "My Notes.md", "");

    let first = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert!(first.status.success(), "fix failed: {}", stderr(&first));
    assert_eq!(read(dir.path(), "index.md"), "[n](<My Notes.md>)\n");

    let second = doclink_cmd(dir.path()).arg("fix").output().unwrap();
    assert!(second.status.success(), "second fix failed: {}", stderr(&second));
    assert_eq!(read(dir.path(), "index.md"), "[n](<My Notes.md>)\n");
    let report: serde_json::Value = serde_json::from_str(&read(dir.path(), "link_fix_results.json")).unwrap();
    assert_eq!(report["summary"]["total_fixes_made"], 0);
}

#[test]
fn unreadable_document_fails_the_check() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "ok\n");
    std::fs::write(dir.path().join("bad.md"), b"[x](a.md)\xff\xfe\n").unwrap();

    let output = doclink_cmd(dir.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("1 files could not be audited"), "unexpected: {}", stdout(&output));
    assert!(stderr(&output).contains("bad.md"));
}

#[test]
fn fix_from_stale_report_skips_deleted_source() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.md", "[x](gone.md)\n");
    write(dir.path(), "b.md", "fine\n");

    let audit = doclink_cmd(dir.path()).arg("audit").output().unwrap();
    assert_eq!(audit.status.code(), Some(1));
    std::fs::remove_file(dir.path().join("a.md")).unwrap();

    let output = doclink_cmd(dir.path()).args(["fix", "--from-report"]).output().unwrap();
    assert!(output.status.success(), "fix failed: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&read(dir.path(), "link_fix_results.json")).unwrap();
    assert_eq!(report["summary"]["total_fixes_made"], 0);
    assert_eq!(report["unfixable_links"][0]["source_file"], "a.md");
    assert_eq!(report["unfixable_links"][0]["reason"], "source missing");
}

#[test]
fn info_reports_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".doclink.toml", "include = 3\n");

    let output = doclink_cmd(dir.path()).args(["info", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["current_state"]["config_found"], true);
    assert!(json["current_state"]["config_error"].as_str().unwrap().contains("toml"));

    let markdown = doclink_cmd(dir.path()).arg("info").output().unwrap();
    assert!(stdout(&markdown).contains("(invalid: "));
}
