//! Status and file type icons

use maud::{Markup, html};

use crate::change::ChangeStatus;

/// Renders the icon for a directory row
pub fn folder_icon() -> Markup {
    html! {
        div class="icon-box" {
            i class="ph-fill ph-folder icon-folder" {}
        }
    }
}

/// Renders the icon for a changed file
///
/// The glyph follows the change status and the CSS modifier colors it, so
/// additions, deletions and conflicts stand apart at a glance.
///
/// # Arguments
///
/// * `status`: Change status of the file
///
/// # Returns
///
/// Icon markup with Phosphor icon class and status modifier
pub fn status_icon(status: ChangeStatus) -> Markup {
    let (icon_class, modifier) = status_classes(status);

    html! {
        div class="icon-box" title=(status.label()) {
            i class=(format!("{} {}", icon_class, modifier)) {}
        }
    }
}

/// Returns Phosphor icon class and CSS modifier for a change status
pub fn status_classes(status: ChangeStatus) -> (&'static str, &'static str) {
    match status {
        ChangeStatus::Added => ("ph ph-file-plus", "status-added"),
        ChangeStatus::Modified => ("ph ph-file-text", "status-modified"),
        ChangeStatus::Deleted => ("ph ph-file-minus", "status-deleted"),
        ChangeStatus::Renamed => ("ph ph-arrow-right", "status-renamed"),
        ChangeStatus::Copied => ("ph ph-copy", "status-copied"),
        ChangeStatus::Unmerged => ("ph ph-warning", "status-unmerged"),
        ChangeStatus::Unknown => ("ph ph-question", "status-unknown"),
    }
}
