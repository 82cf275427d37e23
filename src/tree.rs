//! Change-set tree built from a flat list of change records.
//!
//! Nodes live in an arena owned by [`ChangeTree`]. Children are referenced by
//! [`NodeId`] and every node keeps its parent's id for upward navigation, so
//! ownership only ever flows from the tree to its nodes.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::change::ChangeRecord;

/// Handle to a node in one particular [`ChangeTree`].
///
/// Carries the generation of the tree that issued it, so a handle kept
/// across a rebuild resolves to nothing instead of an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    generation: u64,
    index: usize,
}

impl NodeId {
    /// Generation of the tree this id belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Directory { file_count: usize },
    File(ChangeRecord),
}

/// Directory or file in the change-set hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    path: String,
    kind: NodeKind,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl TreeNode {
    /// Last path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash separated path from the repository root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Change record carried by file nodes.
    pub fn record(&self) -> Option<&ChangeRecord> {
        match &self.kind {
            NodeKind::File(record) => Some(record),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Child ids in display order. Always empty for files.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Number of file nodes anywhere below this directory.
    ///
    /// Zero for file nodes.
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::Directory { file_count } => file_count,
            NodeKind::File(_) => 0,
        }
    }
}

/// Hierarchical view of a comparison result.
///
/// # Performance
///
/// - Construction: O(n log n + n × depth) where n = number of records
/// - Node, children and parent lookups: O(1)
/// - Path lookup: O(depth × siblings)
///
/// # Examples
///
/// ```
/// use gitcompare::{ChangeRecord, ChangeStatus, ChangeTree};
///
/// let tree = ChangeTree::from_records(vec![
///     ChangeRecord::new(ChangeStatus::Modified, "src/main.rs"),
///     ChangeRecord::new(ChangeStatus::Added, "README.md"),
/// ]);
///
/// let src = tree.find("src").expect("directory exists");
/// assert_eq!(tree.node(src).map(|n| n.file_count()), Some(1));
/// assert_eq!(tree.roots().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTree {
    generation: u64,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl ChangeTree {
    /// Builds a tree from unordered change records.
    ///
    /// Equivalent to [`ChangeTree::build`] with generation zero.
    pub fn from_records(records: Vec<ChangeRecord>) -> Self {
        Self::build(0, records)
    }

    /// Builds a tree whose node ids are tagged with `generation`.
    ///
    /// Records are sorted by path, then each path is split on `/`. Every
    /// intermediate prefix (`a`, `a/b`, ...) becomes a directory node the
    /// first time it is seen; the last segment becomes a file node holding
    /// the record. Directory file counts are filled in once all records are
    /// placed.
    ///
    /// Duplicate paths are kept as sibling file nodes.
    ///
    /// # Arguments
    ///
    /// * `generation`: Tag for ids issued by this tree
    /// * `records`: Change records in any order
    pub fn build(generation: u64, mut records: Vec<ChangeRecord>) -> Self {
        records.sort_by(|a, b| compare_paths(a.path(), b.path()));

        let mut tree = Self {
            generation,
            nodes: Vec::with_capacity(records.len()),
            roots: Vec::new(),
        };
        // Scoped to this build only
        let mut directories: HashMap<String, NodeId> = HashMap::new();

        for record in records {
            let segments: Vec<&str> = record.path().split('/').filter(|s| !s.is_empty()).collect();
            let Some((file_name, dirs)) = segments.split_last() else {
                log::debug!("Skipping change record with empty path");
                continue;
            };

            let mut parent = None;
            let mut prefix = String::new();
            for &segment in dirs {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);

                let id = match directories.get(&prefix) {
                    Some(&id) => id,
                    None => {
                        let id = tree.attach(
                            parent,
                            segment,
                            prefix.clone(),
                            NodeKind::Directory { file_count: 0 },
                        );
                        directories.insert(prefix.clone(), id);
                        id
                    }
                };
                parent = Some(id);
            }

            let path = segments.join("/");
            let name = (*file_name).to_string();
            tree.attach(parent, &name, path, NodeKind::File(record));
        }

        tree.count_files();
        tree
    }

    fn attach(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        path: String,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId {
            generation: self.generation,
            index: self.nodes.len(),
        };
        self.nodes.push(TreeNode {
            name: name.to_string(),
            path,
            kind,
            children: Vec::new(),
            parent,
        });
        match parent {
            Some(p) => self.nodes[p.index].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Fills in directory file counts.
    ///
    /// Children are always pushed after their parent, so a reverse sweep
    /// sees every subtree complete before its root.
    fn count_files(&mut self) {
        let mut counts = vec![0usize; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let own = match self.nodes[index].kind {
                NodeKind::File(_) => 1,
                NodeKind::Directory { .. } => counts[index],
            };
            if let NodeKind::Directory { file_count } = &mut self.nodes[index].kind {
                *file_count = own;
            }
            if let Some(parent) = self.nodes[index].parent {
                counts[parent.index] += own;
            }
        }
    }

    /// Generation tag of ids issued by this tree.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Top level nodes in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node for an id issued by this tree.
    ///
    /// Ids from another generation resolve to None.
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    /// Children of a node, empty for files and foreign ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Parent of a node, None for roots and foreign ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent()
    }

    /// Looks up a node by its slash separated path.
    ///
    /// Intermediate segments only match directories. The final segment
    /// prefers a file node and falls back to a directory of that name.
    ///
    /// # Arguments
    ///
    /// * `path`: Path relative to the repository root
    ///
    /// # Returns
    ///
    /// Id of the first matching node, if any
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (last, dirs) = segments.split_last()?;

        let mut level = self.roots.as_slice();
        for segment in dirs {
            let dir = level.iter().copied().find(|&id| {
                let node = &self.nodes[id.index];
                node.is_directory() && node.name == *segment
            })?;
            level = self.nodes[dir.index].children();
        }

        let named = |want_dir: bool| {
            level.iter().copied().find(|&id| {
                let node = &self.nodes[id.index];
                node.is_directory() == want_dir && node.name == *last
            })
        };
        named(false).or_else(|| named(true))
    }

    /// All file nodes in depth-first display order.
    pub fn files(&self) -> Vec<NodeId> {
        let mut files = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index];
            if node.is_directory() {
                stack.extend(node.children.iter().rev().copied());
            } else {
                files.push(id);
            }
        }
        files
    }

    /// Total number of changed files.
    pub fn file_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_directory()).count()
    }

    /// Number of nodes, directories included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Absolute location of a node on disk.
    ///
    /// # Arguments
    ///
    /// * `id`: Node to resolve
    /// * `repository_root`: Root the record paths are relative to
    pub fn absolute_path(&self, id: NodeId, repository_root: &Path) -> Option<PathBuf> {
        let node = self.node(id)?;
        Some(
            node.path
                .split('/')
                .fold(repository_root.to_path_buf(), |acc, s| acc.join(s)),
        )
    }
}

/// Orders paths the way a person reading a file list expects.
///
/// Case-insensitive first so `Readme.md` sits next to `readme.txt`, with raw
/// byte order breaking ties to keep the result deterministic.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
