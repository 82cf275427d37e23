//! Parameters of one active comparison.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::git::ChangeSource;

/// Length of abbreviated commit ids in labels.
const SHORT_ID_LEN: usize = 7;

/// Immutable description of what is being compared, against what.
///
/// Replacing the active comparison means building a new context; there are
/// no setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonContext {
    base_path: PathBuf,
    reference: String,
    reference_label: String,
    repository_root: PathBuf,
    is_directory: bool,
}

impl ComparisonContext {
    /// Creates a context from already resolved parts.
    ///
    /// The label is derived from the reference, see [`reference_label`].
    pub fn new(
        base_path: impl Into<PathBuf>,
        reference: impl Into<String>,
        repository_root: impl Into<PathBuf>,
        is_directory: bool,
    ) -> Self {
        let reference = reference.into();
        Self {
            base_path: base_path.into(),
            reference_label: reference_label(&reference),
            reference,
            repository_root: repository_root.into(),
            is_directory,
        }
    }

    /// Resolves a context for `path` compared against `reference`.
    ///
    /// Canonicalizes the path, asks the source for the repository root and
    /// checks whether the target is a directory. A path deleted from the
    /// working tree is compared as a single file.
    ///
    /// # Errors
    ///
    /// Returns error if the repository root cannot be resolved.
    pub async fn resolve<S: ChangeSource>(
        source: &S,
        path: impl AsRef<Path>,
        reference: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let base_path = canonicalize_lenient(path);
        let repository_root = source
            .resolve_repository_root(&base_path)
            .await
            .with_context(|| format!("Failed to find repository for {}", path.display()))?;

        Ok(Self::new(
            &base_path,
            reference,
            repository_root,
            base_path.is_dir(),
        ))
    }

    /// Absolute path of the file or directory under comparison.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Commit, branch or tag name understood by git.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Display form of the reference.
    pub fn reference_label(&self) -> &str {
        &self.reference_label
    }

    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Slash separated path of the target relative to the repository root.
    ///
    /// Empty when the target is the root itself. Returns None if the target
    /// lies outside the root.
    pub fn relative_path(&self) -> Option<String> {
        let relative = self.base_path.strip_prefix(&self.repository_root).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_str()),
                _ => None,
            })
            .collect();
        segments.map(|s| s.join("/"))
    }

    /// Directory whose changes are fetched.
    ///
    /// The target itself in directory mode, its parent otherwise.
    pub fn scope(&self) -> &Path {
        if self.is_directory {
            &self.base_path
        } else {
            self.base_path.parent().unwrap_or(&self.repository_root)
        }
    }
}

/// Canonicalizes a path that may no longer exist.
///
/// Files deleted from the working tree are resolved through their parent
/// directory so they still compare against the right repository path.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Display label for a reference.
///
/// Full hexadecimal commit ids are shortened, names are kept as given.
pub fn reference_label(reference: &str) -> String {
    let looks_like_id =
        reference.len() > SHORT_ID_LEN && reference.chars().all(|c| c.is_ascii_hexdigit());
    if looks_like_id {
        reference[..SHORT_ID_LEN].to_string()
    } else {
        reference.to_string()
    }
}
