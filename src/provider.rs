//! Holds the active comparison and serves its tree to a rendering host.
//!
//! The provider is either empty or populated with one context and the tree
//! built for it. Hosts pull roots and children on demand and subscribe to a
//! revision counter that moves whenever the tree is replaced or cleared.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::change::{ChangeRecord, ChangeStatus};
use crate::context::ComparisonContext;
use crate::git::ChangeSource;
use crate::tree::{ChangeTree, NodeId, TreeNode};

#[derive(Debug)]
enum State {
    Empty,
    Populated {
        context: ComparisonContext,
        tree: Arc<ChangeTree>,
    },
}

/// Owner of the single active comparison.
///
/// Every operation takes `&self`. Overlapping [`set_context`] calls are
/// allowed; each one takes a sequence number and a result is only applied
/// if no newer call (or [`clear`]) started while it was fetching.
///
/// [`set_context`]: ChangeTreeProvider::set_context
/// [`clear`]: ChangeTreeProvider::clear
///
/// # Examples
///
/// ```no_run
/// use gitcompare::{ChangeTreeProvider, ComparisonContext, GitCli};
///
/// # async fn example() -> anyhow::Result<()> {
/// let git = GitCli::default();
/// let context = ComparisonContext::resolve(&git, "src", "main").await?;
///
/// let provider = ChangeTreeProvider::new(git);
/// provider.set_context(context).await;
/// for root in provider.roots() {
///     println!("{:?}", provider.node(root).map(|n| n.name().to_string()));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChangeTreeProvider<S> {
    source: S,
    state: Mutex<State>,
    sequence: AtomicU64,
    revision: watch::Sender<u64>,
}

impl<S: ChangeSource> ChangeTreeProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(State::Empty),
            sequence: AtomicU64::new(0),
            revision: watch::Sender::new(0),
        }
    }

    /// Source used to fetch change records.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Makes `context` the active comparison.
    ///
    /// Fetches change records for the context's scope, builds a fresh tree
    /// and notifies subscribers. Fetch failures are logged and produce an
    /// empty tree.
    ///
    /// # Returns
    ///
    /// False if a newer `set_context` or `clear` superseded this call while
    /// it was fetching; the result is then dropped.
    pub async fn set_context(&self, context: ComparisonContext) -> bool {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let records = self.fetch(&context).await;

        let tree = Arc::new(ChangeTree::build(sequence, records));

        {
            // Checked under the lock so a concurrent clear cannot interleave
            let mut state = self.lock();
            if self.sequence.load(Ordering::SeqCst) != sequence {
                log::debug!(
                    "Dropping stale comparison against {} (request {sequence})",
                    context.reference_label()
                );
                return false;
            }
            log::info!(
                "Comparing {} against {}: {} changed file(s)",
                context.base_path().display(),
                context.reference_label(),
                tree.file_count()
            );
            *state = State::Populated { context, tree };
        }

        self.notify();
        true
    }

    /// Discards the active comparison.
    ///
    /// Any fetch still in flight will be dropped when it completes.
    pub fn clear(&self) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        *self.lock() = State::Empty;
        self.notify();
    }

    /// Rebuilds the tree for the active context from live data.
    ///
    /// Returns false without doing anything when no context is set.
    pub async fn refresh(&self) -> bool {
        let Some(context) = self.context() else {
            return false;
        };
        self.set_context(context).await
    }

    /// Active comparison context, if any.
    pub fn context(&self) -> Option<ComparisonContext> {
        match &*self.lock() {
            State::Populated { context, .. } => Some(context.clone()),
            State::Empty => None,
        }
    }

    /// Current tree, if a comparison is active.
    pub fn snapshot(&self) -> Option<Arc<ChangeTree>> {
        match &*self.lock() {
            State::Populated { tree, .. } => Some(Arc::clone(tree)),
            State::Empty => None,
        }
    }

    /// Top level nodes, empty when no comparison is active.
    pub fn roots(&self) -> Vec<NodeId> {
        self.snapshot()
            .map(|tree| tree.roots().to_vec())
            .unwrap_or_default()
    }

    /// Children of a node in the current tree.
    ///
    /// Empty for files and for ids issued by a tree that has since been
    /// replaced.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.snapshot()
            .map(|tree| tree.children(id).to_vec())
            .unwrap_or_default()
    }

    /// Parent of a node in the current tree.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.snapshot()?.parent(id)
    }

    /// Copy of a node in the current tree.
    pub fn node(&self, id: NodeId) -> Option<TreeNode> {
        self.snapshot()?.node(id).cloned()
    }

    /// Subscribes to tree changes.
    ///
    /// The value is a counter bumped after every rebuild or clear; hosts
    /// should re-pull roots when it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn fetch(&self, context: &ComparisonContext) -> Vec<ChangeRecord> {
        let records = match self
            .source
            .list_changed_files(
                context.scope(),
                context.reference(),
                context.repository_root(),
            )
            .await
        {
            Ok(records) => records,
            Err(e) => {
                log::warn!(
                    "Failed to list changes against {}: {:#}",
                    context.reference_label(),
                    e
                );
                Vec::new()
            }
        };

        if context.is_directory() {
            return records;
        }

        let Some(target) = context.relative_path() else {
            log::warn!(
                "{} is outside {}",
                context.base_path().display(),
                context.repository_root().display()
            );
            return Vec::new();
        };
        let matched = records.into_iter().find(|r| r.path() == target);
        vec![matched.unwrap_or_else(|| ChangeRecord::new(ChangeStatus::Unknown, target))]
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is replaced wholesale, so a poisoned guard still holds a
        // consistent value.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
