//! Compare files and directories against git revisions, branches and tags.

mod assets;
mod change;
pub mod components;
mod config;
mod context;
mod git;
pub mod pages;
mod provider;
mod render;
mod tree;

pub use change::{ChangeRecord, ChangeStatus, parse_name_status};
pub use config::{Command, Config};
pub use context::{ComparisonContext, reference_label};
pub use git::{
    ChangeSource, CommitInfo, GitCli, RefInfo, RefKind, discover_root, list_commits,
    list_references, read_blob,
};
pub use provider::ChangeTreeProvider;
pub use render::{render_text, summary};
pub use tree::{ChangeTree, NodeId, TreeNode, compare_paths};
