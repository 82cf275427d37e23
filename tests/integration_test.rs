//! Integration tests for gitcompare.
//!
//! Runs the git backed change source, the provider and the history helpers
//! against temporary repositories.

mod common;

use anyhow::Result;
use gitcompare::{
    ChangeSource, ChangeStatus, ChangeTreeProvider, ComparisonContext, GitCli, RefKind,
    discover_root, list_commits, list_references, read_blob,
};
use std::collections::HashMap;

use common::{commit_all, create_base_repo, git, write_file};

/// Stages a representative set of changes on top of `v1`.
fn stage_changes(repo: &std::path::Path) -> Result<()> {
    write_file(repo, "src/lib.rs", "pub fn lib() {}\npub fn more() {}\n")?;
    write_file(repo, "src/new.rs", "pub fn new() {}\n")?;
    std::fs::remove_file(repo.join("README.md"))?;
    git(repo, &["mv", "docs/guide.md", "docs/manual.md"])?;
    git(repo, &["add", "-A"])?;
    Ok(())
}

/// Tests that every status git reports is parsed with the right paths.
#[tokio::test]
async fn test_list_changed_files_reports_statuses() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let root = discover_root(dir.path())?;
    stage_changes(&root)?;
    let git_cli = GitCli::default();

    // Act
    let records = git_cli.list_changed_files(&root, "v1", &root).await?;

    // Assert
    let by_path: HashMap<&str, (ChangeStatus, Option<&str>)> = records
        .iter()
        .map(|r| (r.path(), (r.status(), r.old_path())))
        .collect();

    assert_eq!(by_path.len(), 4, "Unexpected records: {:?}", records);
    assert_eq!(by_path["src/lib.rs"], (ChangeStatus::Modified, None));
    assert_eq!(by_path["src/new.rs"], (ChangeStatus::Added, None));
    assert_eq!(by_path["README.md"], (ChangeStatus::Deleted, None));
    assert_eq!(
        by_path["docs/manual.md"],
        (ChangeStatus::Renamed, Some("docs/guide.md"))
    );

    Ok(())
}

/// Tests the full fetch and build path for a directory comparison.
#[tokio::test]
async fn test_provider_builds_tree_from_git() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let git_cli = GitCli::default();
    let context = ComparisonContext::resolve(&git_cli, dir.path(), "v1").await?;
    stage_changes(context.repository_root())?;
    let provider = ChangeTreeProvider::new(git_cli);

    // Act
    let applied = provider.set_context(context).await;

    // Assert
    assert!(applied);
    let tree = provider.snapshot().expect("tree after set_context");
    assert_eq!(tree.file_count(), 4);

    let src = tree.find("src").and_then(|id| tree.node(id)).expect("src directory");
    assert_eq!(src.file_count(), 2);

    let readme = tree
        .find("README.md")
        .and_then(|id| tree.node(id))
        .expect("README.md leaf");
    assert_eq!(
        readme.record().map(|r| r.status()),
        Some(ChangeStatus::Deleted)
    );
    assert_eq!(readme.parent(), None, "Root files have no parent");

    Ok(())
}

/// Tests that a subdirectory comparison only reports files beneath it.
#[tokio::test]
async fn test_directory_scope_limits_changes() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    stage_changes(dir.path())?;
    let git_cli = GitCli::default();
    let context = ComparisonContext::resolve(&git_cli, dir.path().join("src"), "v1").await?;
    let provider = ChangeTreeProvider::new(git_cli);

    // Act
    provider.set_context(context).await;

    // Assert
    let tree = provider.snapshot().expect("tree");
    assert_eq!(tree.file_count(), 2);
    assert!(tree.find("src/lib.rs").is_some());
    assert!(tree.find("src/new.rs").is_some());
    assert!(tree.find("README.md").is_none());

    Ok(())
}

/// Tests single file comparisons for changed and unchanged files.
#[tokio::test]
async fn test_single_file_comparison() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    stage_changes(dir.path())?;
    let git_cli = GitCli::default();
    let changed = ComparisonContext::resolve(&git_cli, dir.path().join("src/lib.rs"), "v1").await?;
    let unchanged =
        ComparisonContext::resolve(&git_cli, dir.path().join("src/util/strings.rs"), "v1").await?;
    assert!(!changed.is_directory());
    let provider = ChangeTreeProvider::new(git_cli);

    // Act
    provider.set_context(changed).await;
    let changed_tree = provider.snapshot().expect("tree");
    provider.set_context(unchanged).await;
    let unchanged_tree = provider.snapshot().expect("tree");

    // Assert
    let status_of = |tree: &gitcompare::ChangeTree, path: &str| {
        tree.find(path)
            .and_then(|id| tree.node(id))
            .and_then(|n| n.record().map(|r| r.status()))
    };
    assert_eq!(changed_tree.file_count(), 1);
    assert_eq!(status_of(&changed_tree, "src/lib.rs"), Some(ChangeStatus::Modified));
    assert_eq!(unchanged_tree.file_count(), 1);
    assert_eq!(
        status_of(&unchanged_tree, "src/util/strings.rs"),
        Some(ChangeStatus::Unknown)
    );

    Ok(())
}

/// Tests that names git would quote come back verbatim.
#[tokio::test]
async fn test_paths_with_quotes_and_tabs() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    write_file(dir.path(), "say \"hi\".txt", "hi\n")?;
    write_file(dir.path(), "docs/tab\there.txt", "tab\n")?;
    commit_all(dir.path(), "Add awkward names")?;
    write_file(dir.path(), "say \"hi\".txt", "hello\n")?;
    write_file(dir.path(), "docs/tab\there.txt", "tabs\n")?;
    let git_cli = GitCli::default();
    let root = discover_root(dir.path())?;

    // Act
    let records = git_cli.list_changed_files(&root, "HEAD", &root).await?;
    let context =
        ComparisonContext::resolve(&git_cli, dir.path().join("say \"hi\".txt"), "HEAD").await?;
    let provider = ChangeTreeProvider::new(git_cli);
    provider.set_context(context).await;

    // Assert
    let mut paths: Vec<&str> = records.iter().map(|r| r.path()).collect();
    paths.sort();
    assert_eq!(paths, vec!["docs/tab\there.txt", "say \"hi\".txt"]);

    let tree = provider.snapshot().expect("tree");
    let id = tree.find("say \"hi\".txt").expect("quoted file leaf");
    let node = tree.node(id).expect("node");
    assert_eq!(node.name(), "say \"hi\".txt");
    assert_eq!(node.record().map(|r| r.status()), Some(ChangeStatus::Modified));
    assert!(tree.absolute_path(id, &root).is_some_and(|p| p.exists()));

    Ok(())
}

/// Tests that a directory outside the stated root is not widened to the
/// whole repository.
#[tokio::test]
async fn test_foreign_scope_yields_empty_tree() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let other = tempfile::TempDir::new()?;
    write_file(dir.path(), "src/lib.rs", "pub fn changed() {}\n")?;
    let root = discover_root(dir.path())?;
    let context = ComparisonContext::new(other.path(), "HEAD", &root, true);
    let provider = ChangeTreeProvider::new(GitCli::default());

    // Act
    provider.set_context(context).await;

    // Assert
    assert!(provider.roots().is_empty(), "Unrelated changes must not show");

    Ok(())
}

/// Tests that an unknown reference leaves an empty tree instead of failing.
#[tokio::test]
async fn test_bad_reference_yields_empty_tree() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let git_cli = GitCli::default();
    let context =
        ComparisonContext::resolve(&git_cli, dir.path(), "no-such-branch-12345").await?;
    let provider = ChangeTreeProvider::new(git_cli);

    // Act
    let applied = provider.set_context(context).await;

    // Assert
    assert!(applied);
    assert!(provider.roots().is_empty());

    Ok(())
}

/// Tests that refresh re-reads the repository.
#[tokio::test]
async fn test_refresh_sees_new_changes() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let git_cli = GitCli::default();
    let context = ComparisonContext::resolve(&git_cli, dir.path(), "HEAD").await?;
    let provider = ChangeTreeProvider::new(git_cli);
    let changes = provider.subscribe();
    provider.set_context(context).await;
    assert!(provider.roots().is_empty(), "Clean checkout has no changes");

    // Act
    write_file(dir.path(), "src/lib.rs", "pub fn changed() {}\n")?;
    provider.refresh().await;

    // Assert
    assert_eq!(provider.snapshot().map(|t| t.file_count()), Some(1));
    assert_eq!(*changes.borrow(), 2);

    Ok(())
}

/// Tests branch and tag listing.
#[test]
fn test_list_references() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;

    // Act
    let references = list_references(dir.path())?;

    // Assert
    let branches: Vec<&str> = references
        .iter()
        .filter(|r| r.kind() == RefKind::Branch)
        .map(|r| r.name())
        .collect();
    let tags: Vec<&str> = references
        .iter()
        .filter(|r| r.kind() == RefKind::Tag)
        .map(|r| r.name())
        .collect();

    assert!(branches.contains(&"base"), "Branches: {:?}", branches);
    assert_eq!(branches.len(), 2, "Default branch plus base");
    assert_eq!(tags, vec!["v1"]);
    assert_eq!(
        references.last().map(|r| r.kind()),
        Some(RefKind::Tag),
        "Tags come after branches"
    );

    Ok(())
}

/// Tests commit listing and reading content at an older revision.
#[tokio::test]
async fn test_history_and_blob_at_revision() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    write_file(dir.path(), "src/lib.rs", "pub fn second() {}\n")?;
    let head = commit_all(dir.path(), "Second commit")?;
    let git_cli = GitCli::default();

    // Act
    let head_id = git_cli.resolve_revision(dir.path(), "HEAD").await?;
    let v1_id = git_cli.resolve_revision(dir.path(), "v1").await?;
    let commits = list_commits(dir.path(), &head_id, Some(10))?;
    let old_content = read_blob(dir.path(), &v1_id, "src/lib.rs")?;
    let new_content = read_blob(dir.path(), &head_id, "src/lib.rs")?;

    // Assert
    assert_eq!(head_id, head);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message(), "Second commit");
    assert_eq!(commits[1].oid(), v1_id);
    assert_eq!(commits[0].short_oid().len(), 7);
    assert_eq!(commits[0].author(), "Test User");
    assert_eq!(String::from_utf8(old_content)?, "pub fn lib() {}\n");
    assert_eq!(String::from_utf8(new_content)?, "pub fn second() {}\n");

    Ok(())
}

/// Tests blob reads for paths that are missing or name directories.
#[tokio::test]
async fn test_read_blob_errors() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let head_id = GitCli::default().resolve_revision(dir.path(), "HEAD").await?;

    // Act
    let missing = read_blob(dir.path(), &head_id, "nope.txt");
    let directory = read_blob(dir.path(), &head_id, "src");

    // Assert
    assert!(missing.is_err(), "Missing file should fail");
    assert!(directory.is_err(), "Directory should fail");

    Ok(())
}

/// Tests that unknown revisions are reported.
#[tokio::test]
async fn test_resolve_unknown_revision() -> Result<()> {
    let dir = create_base_repo()?;

    let result = GitCli::default()
        .resolve_revision(dir.path(), "no-such-branch-12345")
        .await;

    let err_msg = format!("{:?}", result.unwrap_err());
    assert!(err_msg.contains("Unknown revision: no-such-branch-12345"));
    Ok(())
}

/// Tests that the repository root is found from a nested file.
#[test]
fn test_discover_root_from_nested_file() -> Result<()> {
    let dir = create_base_repo()?;

    let root = discover_root(dir.path().join("src/util/strings.rs"))?;

    assert_eq!(root, dir.path().canonicalize()?);
    Ok(())
}

/// Tests rebasing a feature branch onto an advanced default branch.
#[tokio::test]
async fn test_rebase_onto() -> Result<()> {
    // Arrange
    let dir = create_base_repo()?;
    let path = dir.path();
    let default_branch = git(path, &["rev-parse", "--abbrev-ref", "HEAD"])?;

    git(path, &["checkout", "--quiet", "-b", "feature"])?;
    write_file(path, "feature.txt", "feature\n")?;
    commit_all(path, "Feature work")?;

    git(path, &["checkout", "--quiet", &default_branch])?;
    write_file(path, "upstream.txt", "upstream\n")?;
    commit_all(path, "Upstream work")?;
    git(path, &["checkout", "--quiet", "feature"])?;

    // Act
    GitCli::default().rebase_onto(path, &default_branch).await?;

    // Assert
    git(
        path,
        &["merge-base", "--is-ancestor", &default_branch, "feature"],
    )?;
    assert!(path.join("upstream.txt").exists());
    assert!(path.join("feature.txt").exists());

    Ok(())
}
