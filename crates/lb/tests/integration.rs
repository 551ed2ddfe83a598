//! End-to-end CLI integration tests for the `lb` binary.
//!
//! Each test creates its own temporary directory, initializes a local-only
//! project (no Remote credentials are available in this harness), and
//! exercises the `lb` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lb() -> Command {
    Command::cargo_bin("lb").unwrap()
}

/// Initializes a fresh local-only cache in a temp directory.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    lb().args(["init", "--local-only"]).current_dir(tmp.path()).assert().success();
    tmp
}

/// Creates an issue with `--sync` (so it's applied directly, no worker
/// needed in local-only mode) and returns its id from the `--json` output.
fn create_issue(tmp: &TempDir, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["create", title, "--json"];
    args.extend_from_slice(extra_args);
    let output = lb().args(&args).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success(), "create failed: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

#[test]
fn init_creates_lb_dir() {
    let tmp = TempDir::new().unwrap();
    lb().args(["init", "--local-only"]).current_dir(tmp.path()).assert().success();

    assert!(tmp.path().join(".lb").is_dir());
    assert!(tmp.path().join(".lb").join("cache.db").is_file());
    assert!(tmp.path().join(".lb").join(".gitignore").is_file());
}

#[test]
fn init_refuses_double_init() {
    let tmp = init_project();

    lb().args(["init", "--local-only"]).current_dir(tmp.path()).assert().failure().stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_force_reinitializes() {
    let tmp = init_project();

    lb().args(["init", "--local-only", "--force"]).current_dir(tmp.path()).assert().success();
}

#[test]
fn create_without_title_fails() {
    let tmp = init_project();

    lb().args(["create"]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn create_lists_and_shows() {
    let tmp = init_project();

    let id = create_issue(&tmp, "First issue", &["-p", "1", "-t", "bug"]);

    let list_out = lb().args(["list", "--json"]).current_dir(tmp.path()).output().unwrap();
    assert!(list_out.status.success());
    let list: serde_json::Value = serde_json::from_slice(&list_out.stdout).unwrap();
    let arr = list.as_array().expect("list --json should return an array");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["id"].as_str().unwrap(), id);
    assert_eq!(arr[0]["issue_type"].as_str().unwrap(), "bug");

    lb().args(["show", &id]).current_dir(tmp.path()).assert().success().stdout(predicate::str::contains("First issue"));
}

#[test]
fn show_nonexistent_issue_fails() {
    let tmp = init_project();

    lb().args(["show", "LOCAL-999"]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn update_changes_fields() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Needs an update", &["-p", "3"]);

    lb().args(["update", &id, "--title", "Updated title", "-p", "0"]).current_dir(tmp.path()).assert().success();

    let output = lb().args(["show", &id, "--json"]).current_dir(tmp.path()).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["issue"]["title"].as_str().unwrap(), "Updated title");
    assert_eq!(json["issue"]["priority"].as_i64().unwrap(), 0);
}

#[test]
fn close_then_list_excludes_by_default() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Close me", &[]);

    lb().args(["close", &id]).current_dir(tmp.path()).assert().success();

    let output = lb().args(["list", "--json"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(list.as_array().unwrap().is_empty(), "closed issue should be excluded from the default list view");

    let output = lb().args(["list", "--json", "--all"]).current_dir(tmp.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1, "--all should still show the closed issue");
}

#[test]
fn delete_issue_removes_it() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Delete me", &[]);

    lb().args(["delete", &id, "--force"]).current_dir(tmp.path()).assert().success();

    lb().args(["show", &id]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn delete_without_force_refuses() {
    let tmp = init_project();
    let id = create_issue(&tmp, "Keep me", &[]);

    lb().args(["delete", &id]).current_dir(tmp.path()).assert().failure();

    lb().args(["show", &id]).current_dir(tmp.path()).assert().success();
}

#[test]
fn dependencies_and_ready_set() {
    let tmp = init_project();

    let parent = create_issue(&tmp, "Parent task", &["-p", "1"]);
    let child = create_issue(&tmp, "Child task", &["-p", "2", "--blocked-by", &parent]);
    let unrelated = create_issue(&tmp, "Unrelated task", &["-p", "3"]);

    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    assert!(output.status.success());
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&parent.as_str()), "parent should be ready");
    assert!(ready_ids.contains(&unrelated.as_str()), "unrelated should be ready");
    assert!(!ready_ids.contains(&child.as_str()), "child should be blocked by parent");

    let output = lb().args(["blocked", "--json"]).current_dir(tmp.path()).output().unwrap();
    let blocked: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocked_ids: Vec<&str> = blocked.as_array().unwrap().iter().map(|b| b["issue"]["id"].as_str().unwrap()).collect();
    assert!(blocked_ids.contains(&child.as_str()));

    lb().args(["close", &parent]).current_dir(tmp.path()).assert().success();

    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&child.as_str()), "child should be ready once its blocker is closed");
}

#[test]
fn blocks_flag_is_inverse_of_blocked_by() {
    let tmp = init_project();

    let blocker = create_issue(&tmp, "Blocker", &["-p", "1"]);
    let blockee = create_issue(&tmp, "Blockee", &["-p", "2", "--blocks", &blocker]);

    // `blockee --blocks blocker` means blockee blocks blocker, so blocker
    // (not blockee) should be the one excluded from ready.
    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&blockee.as_str()));
    assert!(!ready_ids.contains(&blocker.as_str()));
}

#[test]
fn dep_add_and_tree() {
    let tmp = init_project();

    let root = create_issue(&tmp, "Root", &[]);
    let leaf = create_issue(&tmp, "Leaf", &[]);

    // `root --blocks leaf` stores the edge (root, leaf); `dep tree root`
    // walks root's own outgoing edges, so it should surface `leaf`.
    lb().args(["dep", "add", &root, "--blocks", &leaf]).current_dir(tmp.path()).assert().success();

    lb().args(["dep", "tree", &root]).current_dir(tmp.path()).assert().success().stdout(predicate::str::contains(&leaf));
}

#[test]
fn dep_remove() {
    let tmp = init_project();
    let a = create_issue(&tmp, "A", &[]);
    let b = create_issue(&tmp, "B", &["--blocked-by", &a]);

    lb().args(["dep", "remove", &a, &b]).current_dir(tmp.path()).assert().success();

    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&b.as_str()), "b should be ready once the dependency is removed");
}

#[test]
fn parent_blocking_inheritance() {
    let tmp = init_project();

    let parent = create_issue(&tmp, "P", &[]);
    let c1 = create_issue(&tmp, "C1", &["--parent", &parent]);
    let c2 = create_issue(&tmp, "C2", &["--parent", &parent]);
    let x = create_issue(&tmp, "X", &["--blocks", &parent]);

    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&x.as_str()));
    assert!(!ready_ids.contains(&parent.as_str()));
    assert!(!ready_ids.contains(&c1.as_str()));
    assert!(!ready_ids.contains(&c2.as_str()));

    lb().args(["close", &x]).current_dir(tmp.path()).assert().success();

    let output = lb().args(["ready", "--json"]).current_dir(tmp.path()).output().unwrap();
    let ready: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready_ids: Vec<&str> = ready.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&parent.as_str()));
}

#[test]
fn export_writes_sorted_jsonl() {
    let tmp = init_project();
    create_issue(&tmp, "B title", &[]);
    create_issue(&tmp, "A title", &[]);

    lb().args(["export"]).current_dir(tmp.path()).assert().success();

    let content = std::fs::read_to_string(tmp.path().join(".lb").join("issues.jsonl")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert!(first["id"].as_str().unwrap() < second["id"].as_str().unwrap());
}

#[test]
fn sync_refuses_in_local_only_mode() {
    let tmp = init_project();

    lb().args(["sync"]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn whoami_requires_credentials() {
    let tmp = init_project();

    lb().args(["whoami"]).current_dir(tmp.path()).assert().failure();
}

#[test]
fn onboard_prints_a_summary() {
    let tmp = init_project();

    lb().args(["onboard"]).current_dir(tmp.path()).assert().success().stdout(predicate::str::contains("lb quick start"));
}

#[test]
fn onboard_writes_to_file() {
    let tmp = init_project();
    let out_path = tmp.path().join("ONBOARDING.md");

    lb().args(["onboard", "-o", out_path.to_str().unwrap()]).current_dir(tmp.path()).assert().success();

    assert!(out_path.is_file());
}

#[test]
fn import_then_export_round_trips() {
    let tmp = init_project();
    let id_a = create_issue(&tmp, "A title", &[]);
    let id_b = create_issue(&tmp, "B title", &[]);
    lb().args(["export"]).current_dir(tmp.path()).assert().success();

    let snapshot_path = tmp.path().join(".lb").join("issues.jsonl");
    let tmp2 = init_project();
    lb().args(["import", "--source", snapshot_path.to_str().unwrap()]).current_dir(tmp2.path()).assert().success();

    let output = lb().args(["list", "--json"]).current_dir(tmp2.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = list.as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&id_a.as_str()));
    assert!(ids.contains(&id_b.as_str()));

    assert!(tmp2.path().join(".lb").join("import-map.jsonl").is_file());
}

#[test]
fn import_dry_run_does_not_write() {
    let tmp = init_project();
    create_issue(&tmp, "Exported", &[]);
    lb().args(["export"]).current_dir(tmp.path()).assert().success();
    let snapshot_path = tmp.path().join(".lb").join("issues.jsonl");

    let tmp2 = init_project();
    lb().args(["import", "--source", snapshot_path.to_str().unwrap(), "--dry-run"])
        .current_dir(tmp2.path())
        .assert()
        .success();

    let output = lb().args(["list", "--json"]).current_dir(tmp2.path()).output().unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(list.as_array().unwrap().is_empty(), "a dry-run import should not write any issues");
}

#[test]
fn migrate_remove_type_labels_dry_run_reports_candidates() {
    let tmp = init_project();
    create_issue(&tmp, "Typed issue", &["-t", "bug"]);
    create_issue(&tmp, "Untyped issue", &[]);

    lb().args(["migrate", "remove-type-labels", "--dry-run", "--json"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"candidates\":1"));
}

#[test]
fn migrate_to_project_dry_run_reports_scope() {
    let tmp = init_project();
    create_issue(&tmp, "Any issue", &[]);

    lb().args(["migrate", "to-project", "--dry-run"]).current_dir(tmp.path()).assert().success();
}
