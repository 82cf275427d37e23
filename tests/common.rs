//! Shared test utilities for integration tests.
//!
//! Builds throwaway git repositories with the real `git` binary.

#![allow(dead_code)]

use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Runs git in `repo_path` and returns trimmed stdout.
///
/// # Errors
///
/// Returns error if git cannot be spawned or exits unsuccessfully
pub fn git(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Creates temporary git repository with test configuration.
///
/// # Errors
///
/// Returns error if git commands fail or directory creation fails
pub fn create_test_repo() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let path = dir.path();

    git(path, &["init", "--quiet"])?;
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "user.email", "test@example.com"])?;
    git(path, &["config", "commit.gpgsign", "false"])?;

    Ok(dir)
}

/// Stages everything and commits, returning the commit hash.
///
/// # Errors
///
/// Returns error if staging or committing fails
pub fn commit_all(repo_path: &Path, message: &str) -> Result<String> {
    git(repo_path, &["add", "-A"])?;
    git(repo_path, &["commit", "--quiet", "-m", message])?;
    git(repo_path, &["rev-parse", "HEAD"])
}

/// Writes file to repository, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(repo_path: &Path, path: &str, content: &str) -> Result<()> {
    let file_path = repo_path.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Creates a repository with one commit tagged `v1` and a branch `base`.
///
/// Layout at that commit:
///
/// ```text
/// README.md
/// src/lib.rs
/// src/util/strings.rs
/// docs/guide.md
/// ```
///
/// # Errors
///
/// Returns error if any git command fails
pub fn create_base_repo() -> Result<TempDir> {
    let dir = create_test_repo()?;
    let path = dir.path();

    write_file(path, "README.md", "# Test\n")?;
    write_file(path, "src/lib.rs", "pub fn lib() {}\n")?;
    write_file(
        path,
        "src/util/strings.rs",
        "pub fn upper(s: &str) -> String {\n    s.to_uppercase()\n}\n",
    )?;
    write_file(
        path,
        "docs/guide.md",
        "# Guide\n\nA long enough guide so rename detection has content to match.\n",
    )?;
    commit_all(path, "Initial commit")?;
    git(path, &["tag", "v1"])?;
    git(path, &["branch", "base"])?;

    Ok(dir)
}
