//! Integration tests for the command-line interface
//!
//! Tests the read, index, apply, and list commands against a temporary root

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const GUIDE: &str = "# Guide\n\nWelcome.\n\n## Install\n\n```bash\nmake\n```\n\n## Usage\n\nRun it.\n";

/// Helper to create a document root with one guide and a nested note
fn setup_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("guide.md"), GUIDE).unwrap();
    fs::create_dir(dir.path().join("notes")).unwrap();
    fs::write(dir.path().join("notes/todo.markdown"), "# Todo\n").unwrap();
    fs::write(dir.path().join("notes/ignored.txt"), "# Not markdown\n").unwrap();
    dir
}

fn mdpath(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdpath"))
        .arg("--root")
        .arg(root)
        .args(args)
        .current_dir(root)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn current_revision(root: &Path, id: &str) -> String {
    let output = mdpath(root, &["read", id, "*", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let slice: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    slice["revision"].as_str().unwrap().to_string()
}

#[test]
fn test_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_mdpath"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Read and edit Markdown sections by semantic path"));
    for command in ["read", "index", "apply", "list"] {
        assert!(text.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_read_section() {
    let root = setup_root();
    let output = mdpath(root.path(), &["read", "guide.md", "guide/install"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "## Install\n\n```bash\nmake\n```\n\n");
    assert!(stderr(&output).contains("revision"));
}

#[test]
fn test_read_field_tag_json() {
    let root = setup_root();
    let output = mdpath(root.path(), &["read", "guide.md", "guide/install#bash", "--json"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let slice: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(slice["text"].as_str().unwrap().starts_with("```bash"));
    assert!(slice["span"]["start"].as_u64().is_some());
}

#[test]
fn test_read_missing_path_suggests() {
    let root = setup_root();
    let output = mdpath(root.path(), &["read", "guide.md", "guide/instal"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("guide/instal"));
    assert!(err.contains("guide/install"));
}

#[test]
fn test_index_json() {
    let root = setup_root();
    let output = mdpath(root.path(), &["index", "guide.md", "--json"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let index: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    for key in ["guide", "guide/install", "guide/install/code-bash", "guide/usage"] {
        assert!(index.get(key).is_some(), "missing {key}");
    }
    assert_eq!(index["guide"]["start"], 0);
    assert_eq!(index["guide"]["end"], GUIDE.len());
}

#[test]
fn test_index_plain() {
    let root = setup_root();
    let output = mdpath(root.path(), &["index", "guide.md"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("guide/usage"));
    assert!(text.contains(&format!("0..{}", GUIDE.len())));
}

#[test]
fn test_apply_replace_with_diff() {
    let root = setup_root();
    let rev = current_revision(root.path(), "guide.md");

    let output = mdpath(
        root.path(),
        &[
            "apply",
            "guide.md",
            "guide/usage",
            "--op",
            "replace",
            "--text",
            "## Usage\n\nRun it twice.\n",
            "--rev",
            &rev,
            "--diff",
        ],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("-Run it."));
    assert!(text.contains("+Run it twice."));

    let updated = fs::read_to_string(root.path().join("guide.md")).unwrap();
    assert!(updated.ends_with("## Usage\n\nRun it twice.\n"));
    assert_ne!(current_revision(root.path(), "guide.md"), rev);
}

#[test]
fn test_apply_text_file_and_delete() {
    let root = setup_root();
    let payload = root.path().join("payload.txt");
    fs::write(&payload, "## Intro\n\nFirst.\n\n").unwrap();

    let rev = current_revision(root.path(), "guide.md");
    let output = mdpath(
        root.path(),
        &[
            "apply",
            "guide.md",
            "guide/install",
            "--op",
            "insert",
            "--text-file",
            payload.to_str().unwrap(),
            "--rev",
            &rev,
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let rev = current_revision(root.path(), "guide.md");
    let output = mdpath(
        root.path(),
        &["apply", "guide.md", "guide/install", "--op", "delete", "--rev", &rev],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let updated = fs::read_to_string(root.path().join("guide.md")).unwrap();
    assert!(updated.contains("## Intro\n\nFirst.\n\n## Usage"));
    assert!(!updated.contains("make"));
}

#[test]
fn test_apply_stale_revision_exits_with_conflict() {
    let root = setup_root();
    let output = mdpath(
        root.path(),
        &[
            "apply",
            "guide.md",
            "guide/usage",
            "--op",
            "replace",
            "--text",
            "gone\n",
            "--rev",
            "0-stale",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("revision conflict"));
    assert_eq!(fs::read_to_string(root.path().join("guide.md")).unwrap(), GUIDE);
}

#[test]
fn test_apply_delete_with_text_is_rejected() {
    let root = setup_root();
    let rev = current_revision(root.path(), "guide.md");
    let output = mdpath(
        root.path(),
        &[
            "apply",
            "guide.md",
            "guide/usage",
            "--op",
            "delete",
            "--text",
            "x",
            "--rev",
            &rev,
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(root.path().join("guide.md")).unwrap(), GUIDE);
}

#[test]
fn test_list_markdown_documents() {
    let root = setup_root();
    let output = mdpath(root.path(), &["list"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let ids: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(ids, vec!["guide.md", "notes/todo.markdown"]);
}

#[test]
fn test_id_outside_root_is_rejected() {
    let root = setup_root();
    let output = mdpath(root.path(), &["read", "guide.md/../../etc/passwd", "x"]);
    assert!(!output.status.success());
}
