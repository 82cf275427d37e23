//! Plain text rendering of a change tree for terminals.

use std::fmt::Write;

use crate::tree::{ChangeTree, NodeId};

const INDENT: &str = "  ";

/// Renders the tree as indented lines.
///
/// Directories show their aggregate file count, files their status letter.
/// Renames and copies show where they came from.
///
/// ```text
/// dir/ (2)
///   A a.txt
///   sub/ (1)
///     M b.txt
/// R new.txt <- old.txt
/// ```
pub fn render_text(tree: &ChangeTree) -> String {
    let mut out = String::new();
    for &root in tree.roots() {
        render_node(tree, root, 0, &mut out);
    }
    out
}

fn render_node(tree: &ChangeTree, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let indent = INDENT.repeat(depth);

    // Writing to a String cannot fail
    let _ = match node.record() {
        Some(record) => match record.old_path() {
            Some(old) => writeln!(
                out,
                "{indent}{} {} <- {old}",
                record.status().letter(),
                node.name()
            ),
            None => writeln!(out, "{indent}{} {}", record.status().letter(), node.name()),
        },
        None => writeln!(out, "{indent}{}/ ({})", node.name(), node.file_count()),
    };

    for &child in node.children() {
        render_node(tree, child, depth + 1, out);
    }
}

/// One line summary, e.g. `3 files changed against main`.
pub fn summary(tree: &ChangeTree, reference_label: &str) -> String {
    match tree.file_count() {
        0 => format!("No changes against {reference_label}"),
        1 => format!("1 file changed against {reference_label}"),
        n => format!("{n} files changed against {reference_label}"),
    }
}
