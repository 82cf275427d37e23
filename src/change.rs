//! Change records and `git diff --name-status` parsing.

use std::fmt;

/// Status of a changed file relative to the comparison reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
    /// Status could not be determined.
    ///
    /// Produced when a single file is compared and git reports nothing for
    /// it, so the tree still has a node to show.
    Unknown,
}

impl ChangeStatus {
    /// Parses the status column of `git diff --name-status`.
    ///
    /// Rename and copy codes carry a similarity score (`R087`, `C100`) which
    /// is ignored. Type changes (`T`) are reported as modifications. Returns
    /// None for codes with no counterpart (`X`, `B`, empty).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'A' => Some(Self::Added),
            'M' | 'T' => Some(Self::Modified),
            'D' => Some(Self::Deleted),
            'R' => Some(Self::Renamed),
            'C' => Some(Self::Copied),
            'U' => Some(Self::Unmerged),
            _ => None,
        }
    }

    /// Single letter shown next to file names.
    pub fn letter(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Copied => 'C',
            Self::Unmerged => 'U',
            Self::Unknown => '?',
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
            Self::Renamed => "Renamed",
            Self::Copied => "Copied",
            Self::Unmerged => "Unmerged",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether records with this status carry an original path.
    pub fn has_old_path(self) -> bool {
        matches!(self, Self::Renamed | Self::Copied)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One changed file, with paths relative to the repository root.
///
/// `old_path` is present exactly when the status is `Renamed` or `Copied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    status: ChangeStatus,
    path: String,
    old_path: Option<String>,
}

impl ChangeRecord {
    /// Creates a record for any status without an original path.
    ///
    /// Renames and copies must go through [`ChangeRecord::moved`]; passing
    /// one of those statuses here yields a record without `old_path`, which
    /// callers should avoid.
    pub fn new(status: ChangeStatus, path: impl Into<String>) -> Self {
        debug_assert!(!status.has_old_path(), "use ChangeRecord::moved");
        Self {
            status,
            path: path.into(),
            old_path: None,
        }
    }

    /// Creates a rename or copy record.
    ///
    /// Returns None when `status` is neither `Renamed` nor `Copied`.
    pub fn moved(
        status: ChangeStatus,
        old_path: impl Into<String>,
        path: impl Into<String>,
    ) -> Option<Self> {
        status.has_old_path().then(|| Self {
            status,
            path: path.into(),
            old_path: Some(old_path.into()),
        })
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    /// Current path, slash separated, relative to the repository root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Original path for renames and copies.
    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }
}

/// Parses `git diff --name-status -z` output into change records.
///
/// Fields are NUL separated so paths arrive unquoted, whatever characters
/// they contain. Each entry is `<code>\0<path>\0` or, for renames and
/// copies, `<code>\0<old>\0<new>\0`. Entries with an unknown status code
/// or a missing path are skipped so that one odd entry does not discard the
/// rest of the listing.
///
/// # Examples
///
/// ```
/// use gitcompare::{ChangeStatus, parse_name_status};
///
/// let records = parse_name_status("M\0src/lib.rs\0R090\0old.txt\0new.txt\0");
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].status(), ChangeStatus::Renamed);
/// assert_eq!(records[1].old_path(), Some("old.txt"));
/// ```
pub fn parse_name_status(output: &str) -> Vec<ChangeRecord> {
    let mut fields = output.split('\0');
    let mut records = Vec::new();

    while let Some(code) = fields.next() {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }

        let Some(status) = ChangeStatus::from_code(code) else {
            // Unknown codes still carry one path
            let path = fields.next();
            log::debug!("Skipping name-status entry with unknown code {code:?}: {path:?}");
            continue;
        };

        let first = fields.next().filter(|p| !p.is_empty());
        let record = if status.has_old_path() {
            let second = fields.next().filter(|p| !p.is_empty());
            match (first, second) {
                (Some(old), Some(new)) => ChangeRecord::moved(status, old, new),
                _ => None,
            }
        } else {
            first.map(|path| ChangeRecord::new(status, path))
        };

        match record {
            Some(record) => records.push(record),
            None => log::debug!("Skipping name-status entry without a path: {code:?}"),
        }
    }

    records
}
