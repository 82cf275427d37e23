//! Git repository operations.
//!
//! Change listings and revision parsing shell out to the `git` binary;
//! discovery, references, history and blob reads go through `gix`.

use anyhow::{Context, Result, bail};
use gix::bstr::ByteSlice;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::change::{ChangeRecord, parse_name_status};

/// Version control queries the change tree depends on.
pub trait ChangeSource {
    /// Lists files under `scope` that differ between the working tree and
    /// `reference`.
    ///
    /// Paths in the returned records are relative to `repository_root`.
    fn list_changed_files(
        &self,
        scope: &Path,
        reference: &str,
        repository_root: &Path,
    ) -> impl Future<Output = Result<Vec<ChangeRecord>>>;

    /// Returns the absolute work tree root containing `path`.
    fn resolve_repository_root(&self, path: &Path) -> impl Future<Output = Result<PathBuf>>;
}

/// Change source backed by the `git` command line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    /// Creates a source running the given git executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs git in `dir` and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns error if git cannot be spawned or exits unsuccessfully.
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        log::debug!("Running git {} in {}", args.join(" "), dir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Resolves any revision expression to a full commit id.
    ///
    /// # Arguments
    ///
    /// * `repo_path`: Path inside the repository
    /// * `reference`: Commit hash, branch, tag or expression such as `HEAD~2`
    ///
    /// # Errors
    ///
    /// Returns error if the reference does not name a commit.
    pub async fn resolve_revision(&self, repo_path: &Path, reference: &str) -> Result<String> {
        check_reference(reference)?;
        let spec = format!("{reference}^{{commit}}");
        let output = self
            .run(repo_path, &["rev-parse", "--verify", "--quiet", &spec])
            .await
            .with_context(|| format!("Unknown revision: {reference}"))?;
        Ok(output.trim().to_string())
    }

    /// Rebases the checked out branch onto `onto`.
    ///
    /// # Errors
    ///
    /// Returns error if git reports a failure, including conflicts that stop
    /// the rebase part way.
    pub async fn rebase_onto(&self, repo_path: &Path, onto: &str) -> Result<String> {
        check_reference(onto)?;
        self.run(repo_path, &["rebase", onto])
            .await
            .with_context(|| format!("Failed to rebase onto {onto}"))
    }
}

impl ChangeSource for GitCli {
    async fn list_changed_files(
        &self,
        scope: &Path,
        reference: &str,
        repository_root: &Path,
    ) -> Result<Vec<ChangeRecord>> {
        check_reference(reference)?;
        let pathspec = scope_pathspec(scope, repository_root)?;

        let output = self
            .run(
                repository_root,
                &[
                    "-c",
                    "core.quotePath=false",
                    "diff",
                    "--name-status",
                    "-z",
                    "--find-renames",
                    "--find-copies",
                    reference,
                    "--",
                    pathspec,
                ],
            )
            .await
            .with_context(|| format!("Failed to diff {pathspec} against {reference}"))?;

        Ok(parse_name_status(&output))
    }

    async fn resolve_repository_root(&self, path: &Path) -> Result<PathBuf> {
        discover_root(path)
    }
}

/// Rejects references git would read as a command line option.
fn check_reference(reference: &str) -> Result<()> {
    if reference.is_empty() || reference.starts_with('-') {
        bail!("Invalid reference: {reference:?}");
    }
    Ok(())
}

/// Pathspec selecting `scope` within `repository_root`, `.` for the root.
///
/// # Errors
///
/// Returns error if `scope` lies outside the root or is not valid UTF-8.
fn scope_pathspec<'a>(scope: &'a Path, repository_root: &Path) -> Result<&'a str> {
    let relative = scope.strip_prefix(repository_root).with_context(|| {
        format!(
            "{} is outside repository {}",
            scope.display(),
            repository_root.display()
        )
    })?;
    if relative.as_os_str().is_empty() {
        return Ok(".");
    }
    relative
        .to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", scope.display()))
}

/// Finds the work tree root of the repository containing `path`.
///
/// Files are looked up through their parent directory.
///
/// # Errors
///
/// Returns error if no repository contains the path or it is bare.
pub fn discover_root(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let start = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };

    let repo = gix::discover(start)
        .with_context(|| format!("Not inside a git repository: {}", path.display()))?;
    let work_dir = repo
        .work_dir()
        .with_context(|| format!("Repository has no work tree: {}", path.display()))?;

    Ok(work_dir
        .canonicalize()
        .unwrap_or_else(|_| work_dir.to_path_buf()))
}

/// Kind of a comparison target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
}

/// Branch or tag that can be compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefInfo {
    name: String,
    kind: RefKind,
}

impl RefInfo {
    /// Short name, e.g. `main` or `v1.0`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }
}

/// Lists local branches followed by tags, each group sorted by name.
///
/// # Arguments
///
/// * `repo_path`: Path inside the repository
///
/// # Errors
///
/// Returns error if the repository or its references cannot be read.
pub fn list_references(repo_path: impl AsRef<Path>) -> Result<Vec<RefInfo>> {
    let repo = gix::discover(repo_path.as_ref()).with_context(|| {
        format!(
            "Failed to open repository at {}",
            repo_path.as_ref().display()
        )
    })?;
    let platform = repo.references().context("Failed to read references")?;

    let branches = short_names(
        platform
            .local_branches()
            .context("Failed to get local branches")?,
    );
    let tags = short_names(platform.tags().context("Failed to get tags")?);

    Ok(branches
        .into_iter()
        .map(|name| RefInfo {
            name,
            kind: RefKind::Branch,
        })
        .chain(tags.into_iter().map(|name| RefInfo {
            name,
            kind: RefKind::Tag,
        }))
        .collect())
}

/// Commit metadata.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    oid: String,
    short_oid: String,
    author: String,
    date: i64,
    message: String,
}

impl CommitInfo {
    /// Full commit hash.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Short commit hash (7 characters).
    pub fn short_oid(&self) -> &str {
        &self.short_oid
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Commit timestamp (Unix seconds).
    pub fn date(&self) -> i64 {
        self.date
    }

    /// First line of commit message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Lists commits reachable from a commit id, newest first.
///
/// # Arguments
///
/// * `repo_path`: Path inside the repository
/// * `commit_id`: Full hexadecimal id to start from, see
///   [`GitCli::resolve_revision`]
/// * `limit`: Optional limit on number of commits to retrieve
///
/// # Errors
///
/// Returns error if the repository cannot be opened, the id is invalid or
/// history traversal fails.
pub fn list_commits(
    repo_path: impl AsRef<Path>,
    commit_id: &str,
    limit: Option<usize>,
) -> Result<Vec<CommitInfo>> {
    let repo = open_repo(repo_path.as_ref())?;
    let commit = find_commit(&repo, commit_id)?;

    let walker = commit
        .ancestors()
        .all()
        .context("Failed to create commit ancestor iterator")?;

    let mut commits = Vec::new();
    for (idx, result) in walker.enumerate() {
        if let Some(max) = limit
            && idx >= max
        {
            break;
        }

        let info = result.context("Failed to traverse commit ancestor")?;
        let commit_obj = info.object().context("Failed to read commit object")?;
        let author = commit_obj.author().context("Failed to read author")?;
        let message = commit_obj
            .message_raw()
            .context("Failed to read commit message")?
            .to_str_lossy()
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        commits.push(CommitInfo {
            oid: commit_obj.id.to_hex().to_string(),
            short_oid: commit_obj.id.to_hex_with_len(7).to_string(),
            author: author.name.to_str_lossy().to_string(),
            date: author.time.seconds,
            message,
        });
    }

    Ok(commits)
}

/// Reads file content as stored at a commit.
///
/// Serves the "before" side of a comparison to an external diff viewer.
///
/// # Arguments
///
/// * `repo_path`: Path inside the repository
/// * `commit_id`: Full hexadecimal commit id
/// * `file_path`: Slash separated path relative to the repository root
///
/// # Errors
///
/// Returns error if the commit cannot be read, the path is missing at that
/// commit or it names a directory.
pub fn read_blob(
    repo_path: impl AsRef<Path>,
    commit_id: &str,
    file_path: impl AsRef<Path>,
) -> Result<Vec<u8>> {
    let repo = open_repo(repo_path.as_ref())?;
    let commit = find_commit(&repo, commit_id)?;
    let mut tree = commit.tree().context("Failed to read commit tree")?;

    let entry = tree
        .peel_to_entry_by_path(file_path.as_ref())
        .context("Failed to traverse tree to path")?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "File not found at {}: {}",
                crate::context::reference_label(commit_id),
                file_path.as_ref().display()
            )
        })?;

    let object = entry.object().context("Failed to read tree entry object")?;
    let blob = object
        .try_into_blob()
        .map_err(|_| anyhow::anyhow!("Path is not a file: {}", file_path.as_ref().display()))?;

    Ok(blob.data.to_vec())
}

fn short_names<'r, E>(
    refs: impl Iterator<Item = std::result::Result<gix::Reference<'r>, E>>,
) -> Vec<String> {
    let mut names: Vec<String> = refs
        .filter_map(|r| {
            r.ok()?
                .name()
                .shorten()
                .to_str()
                .ok()
                .map(|s| s.to_string())
        })
        .collect();
    names.sort();
    names
}

fn open_repo(path: &Path) -> Result<gix::Repository> {
    gix::discover(path)
        .with_context(|| format!("Failed to open repository at {}", path.display()))
}

fn find_commit<'a>(repo: &'a gix::Repository, commit_id: &str) -> Result<gix::Commit<'a>> {
    let id = gix::ObjectId::from_hex(commit_id.as_bytes())
        .with_context(|| format!("Invalid commit id: {commit_id}"))?;
    repo.find_object(id)
        .with_context(|| format!("Failed to find commit {commit_id}"))?
        .try_into_commit()
        .map_err(|_| anyhow::anyhow!("Object {} is not a commit", commit_id))
}
