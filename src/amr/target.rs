use std::fmt;

use crate::tree::{NodeIndex, Tree};

/// A hierarchical structure which can be adapted by [`AmrState`](super::AmrState).
///
/// Refinement and coarsening always act on complete sibling groups: `refine`
/// splits one node into `num_siblings()` children, and `coarsen_siblings_of`
/// merges a whole group back into its parent.
pub trait AmrTarget {
    /// Handle identifying a node. Handles are only stable until the target is
    /// structurally modified.
    type Node: Copy + Ord + fmt::Debug;

    /// Nodes which are candidates for refinement or coarsening (usually the leaves).
    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_;

    /// Nodes sharing a parent with `node`, including `node` itself.
    fn siblings(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Neighbors of `node` across faces, edges and corners, on the same or an
    /// adjacent level.
    fn neighbors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Distance between `node` and the root (the root has level 0).
    fn level(&self, node: Self::Node) -> usize;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Size of a complete sibling group.
    fn num_siblings(&self) -> usize;

    /// Splits a leaf into a complete sibling group.
    fn refine(&mut self, node: Self::Node);

    /// Merges the sibling group of `node` into its parent.
    fn coarsen_siblings_of(&mut self, node: Self::Node);

    /// Diagnostic sink. Forwards to the `log` crate by default.
    fn log(&self, level: log::Level, args: fmt::Arguments) {
        log::log!(level, "{}", args);
    }
}

impl<const N: usize> AmrTarget for Tree<N> {
    type Node = NodeIndex;

    fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.leaves()
    }

    fn siblings(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        Tree::siblings(self, node)
    }

    fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        Tree::neighbors(self, node).into_iter()
    }

    fn level(&self, node: NodeIndex) -> usize {
        Tree::level(self, node)
    }

    fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        Tree::parent(self, node)
    }

    fn num_siblings(&self) -> usize {
        Self::NUM_CHILDREN
    }

    fn refine(&mut self, node: NodeIndex) {
        if Tree::refine(self, node).is_none() {
            panic!(
                "failed to refine node {}, tree capacity of {} nodes is exhausted",
                node.0,
                self.capacity()
            );
        }
    }

    fn coarsen_siblings_of(&mut self, node: NodeIndex) {
        let Some(parent) = Tree::parent(self, node) else {
            panic!("the root node has no siblings to coarsen");
        };

        Tree::coarsen(self, parent);
    }
}
