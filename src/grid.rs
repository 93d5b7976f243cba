use datasize::DataSize;
use std::array;

use crate::amr::AmrTarget;
use crate::geometry::Rectangle;
use crate::tree::{NodeIndex, Tree};

/// A hypertree embedded in a rectangular physical domain. The root covers the
/// whole domain, and every refinement halves a node along each axis.
#[derive(Debug, Clone)]
pub struct Grid<const N: usize> {
    tree: Tree<N>,
    domain: Rectangle<N>,
}

impl<const N: usize> Grid<N> {
    pub fn new(domain: Rectangle<N>, tree: Tree<N>) -> Self {
        Self { tree, domain }
    }

    /// A grid refined uniformly to `level`, with room for `extra_levels` more
    /// uniform refinements.
    pub fn uniform(domain: Rectangle<N>, level: usize, extra_levels: usize) -> Self {
        Self::new(domain, Tree::uniform(level, extra_levels))
    }

    pub fn tree(&self) -> &Tree<N> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree<N> {
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree<N> {
        self.tree
    }

    pub fn domain(&self) -> Rectangle<N> {
        self.domain
    }

    /// Physical region covered by a node.
    pub fn bounds(&self, node: NodeIndex) -> Rectangle<N> {
        self.tree
            .location(node)
            .splits()
            .fold(self.domain, |bounds, split| bounds.split(split))
    }

    /// Center of the region covered by a node.
    pub fn center(&self, node: NodeIndex) -> [f64; N] {
        self.bounds(node).center()
    }

    /// Size of a node on the given level along each axis.
    pub fn spacing(&self, level: usize) -> [f64; N] {
        let scale = 0.5f64.powi(level as i32);
        array::from_fn(|axis| self.domain.size[axis] * scale)
    }

    /// Largest extent of a node on the given level.
    pub fn length(&self, level: usize) -> f64 {
        self.spacing(level).into_iter().fold(0.0, f64::max)
    }

    /// Re-sorts the underlying tree, see [`Tree::dfs_sort`].
    pub fn dfs_sort(&mut self, data_swap: impl FnMut(NodeIndex, NodeIndex)) {
        self.tree.dfs_sort(data_swap);
    }
}

impl<const N: usize> AmrTarget for Grid<N> {
    type Node = NodeIndex;

    fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        AmrTarget::nodes(&self.tree)
    }

    fn siblings(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.tree.siblings(node)
    }

    fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.tree.neighbors(node).into_iter()
    }

    fn level(&self, node: NodeIndex) -> usize {
        self.tree.level(node)
    }

    fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.tree.parent(node)
    }

    fn num_siblings(&self) -> usize {
        Tree::<N>::NUM_CHILDREN
    }

    fn refine(&mut self, node: NodeIndex) {
        AmrTarget::refine(&mut self.tree, node);
    }

    fn coarsen_siblings_of(&mut self, node: NodeIndex) {
        self.tree.coarsen_siblings_of(node);
    }
}

impl<const N: usize> DataSize for Grid<N> {
    const IS_DYNAMIC: bool = true;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        self.tree.estimate_heap_size()
    }
}
