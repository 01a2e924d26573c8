use crate::ast::{NodeId, SyntaxTree};
use crate::error::PassError;

/// What a pass did to the tree. A scheduler re-runs dependent passes when [`PassOutcome::changed`]
/// is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    changes: usize,
}

impl PassOutcome {
    /// Records one structural or annotation change.
    pub fn report_code_change(&mut self) {
        self.changes += 1;
    }

    /// Number of changes reported.
    pub fn changes(&self) -> usize {
        self.changes
    }

    /// Whether the pass changed anything.
    pub fn changed(&self) -> bool {
        self.changes > 0
    }
}

/// A transformation over a whole [`SyntaxTree`].
pub trait CompilerPass {
    /// A short name for logging.
    fn name(&self) -> &'static str;

    /// Runs the pass over the tree, mutating it in place.
    fn process(&mut self, tree: &mut SyntaxTree) -> Result<PassOutcome, PassError>;
}

/// Called by [`traverse`] for every node, after all of the node's children.
pub trait PostOrderCallback {
    /// Visits a node. The node's parent is available through [`SyntaxTree::parent`]; it is
    /// `None` if an earlier visit already detached the node.
    fn visit(&mut self, tree: &mut SyntaxTree, node: NodeId) -> Result<(), PassError>;
}

/// Walks the subtree at `root` in post-order, siblings left to right.
///
/// The children of a node are read once, before descending into them, so a visit may replace
/// or remove the statement it belongs to without disturbing the walk. Nodes inserted during the
/// walk are not visited.
pub fn traverse<C>(tree: &mut SyntaxTree, root: NodeId, callback: &mut C) -> Result<(), PassError>
where
    C: PostOrderCallback + ?Sized,
{
    let children = tree.children(root).to_vec();
    for child in children {
        traverse(tree, child, callback)?;
    }
    callback.visit(tree, root)
}
