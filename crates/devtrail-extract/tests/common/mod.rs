//! git2 fixture helpers shared by the integration tests

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use git2::{Commit, Oid, Repository, Signature, Time};
use std::path::Path;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn ago(hours: i64) -> i64 {
    (now() - Duration::hours(hours)).timestamp()
}

pub fn write(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Stages `paths` (removing those missing on disk) and commits the index.
pub fn commit(
    repo: &Repository,
    paths: &[&str],
    message: &str,
    when: i64,
    parents: &[Oid],
    update_head: bool,
) -> Result<Oid> {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index()?;
    for rel in paths {
        if workdir.join(rel).exists() {
            index.add_path(Path::new(rel))?;
        } else {
            index.remove_path(Path::new(rel))?;
        }
    }
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let sig = Signature::new("Jane Doe", "jdoe@example.com", &Time::new(when, 0))?;
    let parents: Vec<Commit> = parents
        .iter()
        .map(|oid| repo.find_commit(*oid))
        .collect::<Result<_, _>>()?;
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    let update_ref = if update_head { Some("HEAD") } else { None };

    Ok(repo.commit(update_ref, &sig, &sig, message, &tree, &parent_refs)?)
}

pub struct Fixture {
    pub c1: Oid,
    pub side: Oid,
    pub c2: Oid,
}

/// Builds a small history under `root`:
///
/// ```text
/// c0 (100 days old) - c1 - c2 ------- merge
///                      \             /
///                       side -------
/// ```
pub fn build_fixture(root: &Path) -> Result<Fixture> {
    let repo = Repository::init(root)?;

    write(root, "README.md", "hello\n")?;
    let c0 = commit(&repo, &["README.md"], "Initial commit", ago(100 * 24), &[], true)?;

    write(root, "src/a.rs", "line1\nline2\nline3\nline4\nline5\n")?;
    write(root, "src/b.rs", "b1\nb2\nb3\n")?;
    write(root, "src/c.py", "c1\nc2\n")?;
    let c1 = commit(
        &repo,
        &["src/a.rs", "src/b.rs", "src/c.py"],
        "Fix bug in parser",
        ago(48),
        &[c0],
        true,
    )?;

    write(root, "notes.sh", "echo hi\n")?;
    let side = commit(&repo, &["notes.sh"], "Update notes", ago(36), &[c1], false)?;

    std::fs::remove_file(root.join("notes.sh"))?;
    write(root, "src/a.rs", "line1\nLINE2\nline3\nLINE4\nline5\n")?;
    let c2 = commit(
        &repo,
        &["notes.sh", "src/a.rs"],
        "Add new lexer token table",
        ago(24),
        &[c1],
        true,
    )?;

    write(root, "notes.sh", "echo hi\n")?;
    commit(&repo, &["notes.sh"], "Merge branch 'side'", ago(12), &[c2, side], true)?;

    Ok(Fixture { c1, side, c2 })
}
