//! CSS asset bundling

const BASE: &str = include_str!("../assets/base.css");
const CHANGE_TREE: &str = include_str!("../assets/change-tree.css");

/// Returns the stylesheet for comparison reports
pub fn report_css() -> String {
    [BASE, CHANGE_TREE].join("\n")
}
