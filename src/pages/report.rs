//! Comparison report page

use maud::{Markup, html};

use crate::assets::report_css;
use crate::components::icons::{folder_icon, status_icon};
use crate::components::layout::page_wrapper;
use crate::context::ComparisonContext;
use crate::render::summary;
use crate::tree::{ChangeTree, NodeId};

/// Generates an HTML report for one comparison
///
/// Renders the change tree as nested lists. Directories show their aggregate
/// file count; files link to their location on disk and carry a status icon.
///
/// # Arguments
///
/// * `context`: Comparison the tree was built for
/// * `tree`: Change tree to render
///
/// # Returns
///
/// Complete HTML document
///
/// # Examples
///
/// ```
/// use gitcompare::{ChangeTree, ComparisonContext};
/// use gitcompare::pages::report::generate;
///
/// let context = ComparisonContext::new("/repo", "main", "/repo", true);
/// let html = generate(&context, &ChangeTree::default()).into_string();
/// assert!(html.contains("No changes against main"));
/// ```
pub fn generate(context: &ComparisonContext, tree: &ChangeTree) -> Markup {
    let target = match context.relative_path() {
        Some(path) if !path.is_empty() => path,
        _ => context
            .repository_root()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repository")
            .to_string(),
    };
    let title = format!("{} vs {}", target, context.reference_label());

    let body = html! {
        header class="report-header" {
            h1 { (target) }
            div class="report-meta" {
                (summary(tree, context.reference_label()))
                " · "
                code { (context.reference()) }
            }
        }
        main class="change-tree" {
            @if tree.roots().is_empty() {
                p class="empty-state" { "Nothing to show" }
            } @else {
                ul {
                    @for &root in tree.roots() {
                        (node_item(tree, root, context))
                    }
                }
            }
        }
    };

    page_wrapper(&title, &report_css(), body)
}

fn node_item(tree: &ChangeTree, id: NodeId, context: &ComparisonContext) -> Markup {
    let Some(node) = tree.node(id) else {
        return html! {};
    };

    match node.record() {
        Some(record) => {
            let href = tree
                .absolute_path(id, context.repository_root())
                .map(|p| format!("file://{}", p.display()))
                .unwrap_or_default();
            html! {
                li {
                    div class="change-row" title=(node.path()) {
                        (status_icon(record.status()))
                        a href=(href) { (node.name()) }
                        @if let Some(old) = record.old_path() {
                            span class="old-path" { "from " (old) }
                        }
                    }
                }
            }
        }
        None => html! {
            li {
                div class="change-row" title=(node.path()) {
                    (folder_icon())
                    span { (node.name()) }
                    span class="file-count" { (node.file_count()) }
                }
                ul {
                    @for &child in node.children() {
                        (node_item(tree, child, context))
                    }
                }
            }
        },
    }
}
