//! CLI integration tests
//!
//! These tests run the compiled `devtrail` binary directly, so they work
//! even though the command functions live in private modules of the bin crate.

use git2::{Repository, Signature, Time};
use std::path::Path;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

fn bin(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_devtrail"));
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

/// Creates `root/name` with a single commit touching three files.
fn init_repo(root: &Path, name: &str, message: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::write(dir.join("src/main.rs"), "fn main() {}\n// a\n// b\n").unwrap();
    std::fs::write(dir.join("src/lib.rs"), "pub mod x;\n").unwrap();
    std::fs::write(dir.join("README.md"), "demo\n").unwrap();

    let repo = Repository::init(&dir).unwrap();
    let mut index = repo.index().unwrap();
    for rel in ["src/main.rs", "src/lib.rs", "README.md"] {
        index.add_path(Path::new(rel)).unwrap();
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    let sig = Signature::new("Jane Doe", "jdoe@example.com", &Time::new(now - 3600, 0)).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[]).unwrap();
}

// ── help / version ────────────────────────────────────────────────────────────

#[test]
fn test_help_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let status = bin(tmp.path()).arg("--help").status().expect("failed to run binary");
    assert!(status.success(), "--help should exit 0");
}

#[test]
fn test_version_flag() {
    let tmp = TempDir::new().unwrap();
    let output = bin(tmp.path()).arg("--version").output().expect("failed to run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("devtrail"),
        "version output should contain binary name, got: {}",
        stdout
    );
}

#[test]
fn test_subcommand_help_lists_targets() {
    let tmp = TempDir::new().unwrap();
    let output = bin(tmp.path()).args(["import", "--help"]).output().expect("failed to run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("elasticsearch"), "got: {}", stdout);
}

// ── extract ───────────────────────────────────────────────────────────────────

#[test]
fn test_extract_missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    let status = bin(tmp.path())
        .arg("extract")
        .arg("--root").arg(tmp.path().join("does-not-exist"))
        .arg("--output").arg(tmp.path().join("out.json"))
        .status()
        .expect("failed to run binary");

    assert!(!status.success(), "missing root should exit non-zero");
    assert!(!tmp.path().join("out.json").exists());
}

#[test]
fn test_extract_writes_interchange_file() {
    let tmp = TempDir::new().unwrap();
    let projects = tmp.path().join("projects");
    init_repo(&projects, "parser", "Fix bug in parser");
    std::fs::create_dir_all(projects.join("not-a-repo")).unwrap();
    let out = tmp.path().join("out/commits.json");

    let output = bin(tmp.path())
        .arg("extract")
        .arg("--root").arg(&projects)
        .arg("--output").arg(&out)
        .arg("--since-days").arg("3650")
        .output()
        .expect("failed to run binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = std::fs::read_to_string(&out).unwrap();
    let records: serde_json::Value = serde_json::from_str(&text).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record["repository"], "parser");
    assert_eq!(record["commit_type"], "bugfix");
    assert_eq!(record["primary_language"], "rust");
    assert_eq!(record["files_changed"], 3);
    assert_eq!(record["author_email_anonymized"], "j***@example.com");
    let hash = record["hash"].as_str().unwrap();
    assert_eq!(record["memory_id"], format!("git_{}", &hash[..16]));
}

#[test]
fn test_extract_honours_exclusions() {
    let tmp = TempDir::new().unwrap();
    let projects = tmp.path().join("projects");
    init_repo(&projects, "parser", "Fix bug in parser");
    init_repo(&projects, "web", "Add login page");
    let out = tmp.path().join("commits.json");

    let status = bin(tmp.path())
        .arg("extract")
        .arg("--root").arg(&projects)
        .arg("--output").arg(&out)
        .arg("--exclude").arg("web")
        .status()
        .expect("failed to run binary");
    assert!(status.success());

    let records: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["repository"], "parser");
}

#[test]
fn test_extract_accepts_largest_window() {
    let tmp = TempDir::new().unwrap();
    let projects = tmp.path().join("projects");
    init_repo(&projects, "parser", "Fix bug in parser");
    let out = tmp.path().join("commits.json");

    let output = bin(tmp.path())
        .arg("extract")
        .arg("--root").arg(&projects)
        .arg("--output").arg(&out)
        .arg("--since-days").arg(u32::MAX.to_string())
        .output()
        .expect("failed to run binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let records: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

// ── import ────────────────────────────────────────────────────────────────────

#[test]
fn test_import_missing_interchange_fails() {
    let tmp = TempDir::new().unwrap();
    let status = bin(tmp.path())
        .args(["import", "all", "--input"])
        .arg(tmp.path().join("missing.json"))
        .status()
        .expect("failed to run binary");
    assert!(!status.success(), "unreadable interchange file should exit non-zero");
}

#[test]
fn test_missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    let status = bin(tmp.path())
        .arg("--config").arg(tmp.path().join("nope.toml"))
        .arg("extract")
        .status()
        .expect("failed to run binary");
    assert!(!status.success());
}

// ── analyze ───────────────────────────────────────────────────────────────────

#[test]
fn test_analyze_reports_patterns() {
    let tmp = TempDir::new().unwrap();
    let projects = tmp.path().join("projects");
    init_repo(&projects, "parser", "Fix bug in parser");
    init_repo(&projects, "web", "Add login page");
    let out = tmp.path().join("commits.json");

    let status = bin(tmp.path())
        .arg("extract")
        .arg("--root").arg(&projects)
        .arg("--output").arg(&out)
        .status()
        .expect("failed to run binary");
    assert!(status.success());

    let output = bin(tmp.path())
        .arg("analyze")
        .arg("--input").arg(&out)
        .output()
        .expect("failed to run binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for expected in ["Repository Productivity", "Author Patterns", "Hourly Activity", "parser", "web", "Jane Doe", "bugfix"] {
        assert!(stdout.contains(expected), "missing {:?} in: {}", expected, stdout);
    }
    // one author everywhere, so nobody shares a repository
    assert!(stdout.contains("No repository has more than one author"), "got: {}", stdout);
}

#[test]
fn test_analyze_missing_interchange_fails() {
    let tmp = TempDir::new().unwrap();
    let status = bin(tmp.path())
        .arg("analyze")
        .arg("--input").arg(tmp.path().join("missing.json"))
        .status()
        .expect("failed to run binary");
    assert!(!status.success());
}
