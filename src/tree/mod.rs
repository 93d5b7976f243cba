//! A capacity bounded, vector backed `N`-dimensional hypertree.
//!
//! Siblings (nodes sharing a parent) are stored contiguously in memory in
//! Morton z-order and form a *sibling group*. Each node stores the index of its
//! first child, and each sibling group stores the index of its parent. Groups
//! freed by coarsening are reused by later refinements, so the node storage
//! is not necessarily compact until the tree is re-sorted with
//! [`Tree::dfs_sort`].

use datasize::DataSize;
use std::ops::Range;
use thiserror::Error;

use crate::geometry::AxisMask;

mod location;
mod neighbors;
mod sort;

pub use location::Location;

/// Null index, used internally to make storage of `Option<usize>` more efficient.
const NULL: usize = usize::MAX;

/// Index of a node within a tree.
///
/// Indices are stable until the tree is structurally modified in a way that
/// moves nodes (coarsening frees indices, sorting relocates them).
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    /// The root node is always stored at index 0.
    pub const ROOT: NodeIndex = NodeIndex(0);
}

/// Index of a sibling group within a tree.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize,
)]
pub struct SiblingGroupIndex(pub usize);

impl SiblingGroupIndex {
    /// The group containing only the root node.
    pub const ROOT: SiblingGroupIndex = SiblingGroupIndex(0);
}

/// Number of nodes in a tree uniformly refined up to (and including) `level`.
pub fn num_nodes_until_uniform_level(dimension: usize, level: usize) -> usize {
    let children = 2usize.pow(dimension as u32);
    (0..=level).map(|l| children.pow(l as u32)).sum()
}

/// Inconsistencies found when restoring a tree from serialized data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("{nodes} nodes do not fill {groups} sibling groups")]
    Capacity { groups: usize, nodes: usize },
    #[error("sibling group {group} is not linked to its parent")]
    GroupLink { group: usize },
    #[error("node {node} is not linked to its children")]
    ChildLink { node: usize },
    #[error("tree has size {size}, but {found} nodes are in use")]
    Size { size: usize, found: usize },
    #[error("tree has size {size}, but {reachable} nodes are reachable from the root")]
    Unreachable { size: usize, reachable: usize },
    #[error("first free sibling group is {found}, expected {expected}")]
    FirstFreeGroup { found: usize, expected: usize },
}

/// An `N`-dimensional hypertree which subdivides each axis in two in each
/// refinement step.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TreeData")]
pub struct Tree<const N: usize> {
    /// Parent node of each sibling group (`NULL` if the group is free).
    parents: Vec<usize>,
    /// First child of each node (`NULL` for leaves).
    first_children: Vec<usize>,
    /// Number of nodes in use.
    size: usize,
    /// First sibling group which is not in use.
    first_free_group: usize,
}

impl<const N: usize> Tree<N> {
    /// Number of children of a refined node.
    pub const NUM_CHILDREN: usize = AxisMask::<N>::COUNT;

    /// Creates a tree with capacity for at least `capacity` nodes, initialized with
    /// a single root node.
    pub fn with_capacity(capacity: usize) -> Self {
        let num_groups = Self::num_sibling_groups(capacity);
        assert!(num_groups > 0, "cannot construct a tree with zero capacity");

        Self {
            parents: vec![NULL; num_groups],
            first_children: vec![NULL; Self::num_nodes(num_groups)],
            size: 1,
            first_free_group: 1,
        }
    }

    /// Creates a tree uniformly refined up to `level`, with exactly enough capacity for
    /// `extra_levels` further uniform refinements.
    pub fn uniform(level: usize, extra_levels: usize) -> Self {
        let mut tree = Self::with_capacity(num_nodes_until_uniform_level(N, level + extra_levels));
        tree.refine_uniformly(level);
        tree
    }

    // *******************************
    // Memory layout *****************

    /// Number of sibling groups required to hold `num_nodes` nodes.
    pub fn num_sibling_groups(num_nodes: usize) -> usize {
        if num_nodes == 0 {
            return 0;
        }

        Self::sibling_group(NodeIndex(num_nodes - 1)).0 + 1
    }

    /// Number of nodes held by `num_groups` sibling groups.
    pub fn num_nodes(num_groups: usize) -> usize {
        match num_groups {
            0 => 0,
            1 => 1,
            _ => (num_groups - 1) * Self::NUM_CHILDREN + 1,
        }
    }

    /// Sibling group which contains the given node.
    pub fn sibling_group(node: NodeIndex) -> SiblingGroupIndex {
        SiblingGroupIndex(node.0.div_ceil(Self::NUM_CHILDREN))
    }

    /// First node in the given sibling group.
    pub fn first_node(group: SiblingGroupIndex) -> NodeIndex {
        if group.0 == 0 {
            return NodeIndex::ROOT;
        }

        NodeIndex(1 + Self::NUM_CHILDREN * (group.0 - 1))
    }

    /// Nodes within a sibling group.
    pub fn group_nodes(group: SiblingGroupIndex) -> Range<usize> {
        let first = Self::first_node(group).0;

        if group == SiblingGroupIndex::ROOT {
            first..first + 1
        } else {
            first..first + Self::NUM_CHILDREN
        }
    }

    /// Maximum number of sibling groups the tree can hold.
    pub fn sibling_group_capacity(&self) -> usize {
        self.parents.len()
    }

    /// Maximum number of nodes the tree can hold.
    pub fn capacity(&self) -> usize {
        self.first_children.len()
    }

    /// Number of nodes in use.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Is the tree only a root node?
    pub fn is_root_only(&self) -> bool {
        self.size == 1
    }

    /// Does the tree have a compact representation? That is, no free sibling groups
    /// precede the last sibling group in use.
    pub fn is_compact(&self) -> bool {
        let end = Self::num_sibling_groups(self.size);
        let result = self.first_free_group == end;

        debug_assert_eq!(
            result,
            (0..end).all(|group| !self.is_free(SiblingGroupIndex(group))),
            "first free sibling group is out of sync"
        );

        result
    }

    /// A sibling group is free if it has no parent. The root group is never free.
    pub fn is_free(&self, group: SiblingGroupIndex) -> bool {
        group != SiblingGroupIndex::ROOT && self.parents[group.0] == NULL
    }

    // *******************************
    // Relations *********************

    /// True if the node has no children.
    pub fn is_leaf(&self, node: NodeIndex) -> bool {
        self.first_children[node.0] == NULL
    }

    pub fn is_root(node: NodeIndex) -> bool {
        node == NodeIndex::ROOT
    }

    /// Parent of the sibling group. `None` for the root group or free groups.
    pub fn group_parent(&self, group: SiblingGroupIndex) -> Option<NodeIndex> {
        match self.parents[group.0] {
            NULL => None,
            parent => Some(NodeIndex(parent)),
        }
    }

    /// The parent of a given node.
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.group_parent(Self::sibling_group(node))
    }

    /// Sibling group formed by the children of a node, `None` for leaves.
    pub fn children_group(&self, node: NodeIndex) -> Option<SiblingGroupIndex> {
        match self.first_children[node.0] {
            NULL => None,
            child => Some(Self::sibling_group(NodeIndex(child))),
        }
    }

    /// Children of the node (empty for leaves).
    pub fn children(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + ExactSizeIterator {
        let range = match self.first_children[node.0] {
            NULL => 0..0,
            child => child..child + Self::NUM_CHILDREN,
        };
        range.map(NodeIndex)
    }

    /// Returns a child of a given node.
    pub fn child(&self, node: NodeIndex, split: AxisMask<N>) -> Option<NodeIndex> {
        match self.first_children[node.0] {
            NULL => None,
            child => Some(NodeIndex(child + split.to_linear())),
        }
    }

    /// Nodes which share a parent with the given node (including the node itself).
    pub fn siblings(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + ExactSizeIterator {
        Self::group_nodes(Self::sibling_group(node)).map(NodeIndex)
    }

    /// Position of a (non root) node within its parent.
    pub fn position_in_parent(node: NodeIndex) -> AxisMask<N> {
        debug_assert!(!Self::is_root(node));
        AxisMask::from_linear((node.0 - 1) % Self::NUM_CHILDREN)
    }

    /// Distance between the node and the root.
    pub fn level(&self, node: NodeIndex) -> usize {
        let mut level = 0;
        let mut cursor = node;

        while let Some(parent) = self.parent(cursor) {
            cursor = parent;
            level += 1;
        }

        level
    }

    /// Iterates all sibling groups in use.
    pub fn sibling_groups(&self) -> impl Iterator<Item = SiblingGroupIndex> + '_ {
        (0..self.sibling_group_capacity())
            .map(SiblingGroupIndex)
            .filter(|&group| !self.is_free(group))
    }

    /// Iterates all nodes in use (the tree does not need to be compact).
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.sibling_groups()
            .flat_map(|group| Self::group_nodes(group).map(NodeIndex))
    }

    /// Iterates all nodes without children.
    pub fn leaves(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes().filter(|&node| self.is_leaf(node))
    }

    /// Number of leaves in the tree.
    pub fn num_leaves(&self) -> usize {
        let num_refined = (self.size - 1) / Self::NUM_CHILDREN;
        self.size - num_refined
    }

    /// The maximum depth of this tree.
    pub fn num_levels(&self) -> usize {
        self.leaves()
            .map(|leaf| self.level(leaf) + 1)
            .max()
            .unwrap_or(1)
    }

    // *******************************
    // Mutation **********************

    /// Refines a leaf node, allocating its children in the first free sibling group.
    ///
    /// Returns the sibling group of the children, or `None` if the tree is full.
    pub fn refine(&mut self, node: NodeIndex) -> Option<SiblingGroupIndex> {
        assert!(
            !self.is_free(Self::sibling_group(node)),
            "node {} is free and cannot be refined",
            node.0
        );
        assert!(
            self.is_leaf(node),
            "node {} is not a leaf and cannot be refined",
            node.0
        );

        if self.size == self.capacity() {
            return None;
        }

        let group = self.first_free_group;
        debug_assert!(self.is_free(SiblingGroupIndex(group)));

        self.size += Self::NUM_CHILDREN;
        self.first_free_group = (group + 1..self.sibling_group_capacity())
            .find(|&g| self.parents[g] == NULL)
            .unwrap_or(self.sibling_group_capacity());

        self.parents[group] = node.0;
        self.first_children[node.0] = Self::first_node(SiblingGroupIndex(group)).0;

        Some(SiblingGroupIndex(group))
    }

    /// Coarsens a node by removing its children, which must all be leaves.
    pub fn coarsen(&mut self, node: NodeIndex) {
        let Some(group) = self.children_group(node) else {
            panic!("node {} is a leaf and cannot be coarsened", node.0);
        };

        assert!(
            self.children(node).all(|child| self.is_leaf(child)),
            "node {} has children which are not leaves",
            node.0
        );

        self.size -= Self::NUM_CHILDREN;
        self.first_free_group = self.first_free_group.min(group.0);

        self.parents[group.0] = NULL;
        self.first_children[node.0] = NULL;
    }

    /// Refines every leaf until all leaves lie on `level` (or deeper).
    pub fn refine_uniformly(&mut self, level: usize) {
        loop {
            let coarse = self
                .leaves()
                .filter(|&leaf| self.level(leaf) < level)
                .collect::<Vec<_>>();

            if coarse.is_empty() {
                break;
            }

            for leaf in coarse {
                assert!(
                    self.refine(leaf).is_some(),
                    "tree capacity {} exhausted during uniform refinement",
                    self.capacity()
                );
            }
        }
    }
}

/// Unchecked serialized form of a [`Tree`].
#[derive(serde::Deserialize)]
struct TreeData {
    parents: Vec<usize>,
    first_children: Vec<usize>,
    size: usize,
    first_free_group: usize,
}

impl<const N: usize> TryFrom<TreeData> for Tree<N> {
    type Error = TreeError;

    fn try_from(data: TreeData) -> Result<Self, Self::Error> {
        let groups = data.parents.len();
        let nodes = data.first_children.len();

        if groups == 0 || nodes != Self::num_nodes(groups) {
            return Err(TreeError::Capacity { groups, nodes });
        }

        let tree = Self {
            parents: data.parents,
            first_children: data.first_children,
            size: data.size,
            first_free_group: data.first_free_group,
        };

        if tree.parents[0] != NULL {
            return Err(TreeError::GroupLink { group: 0 });
        }

        for group in tree.sibling_groups().skip(1) {
            let parent = tree.parents[group.0];
            let linked = parent < nodes
                && !tree.is_free(Self::sibling_group(NodeIndex(parent)))
                && tree.first_children[parent] == Self::first_node(group).0;

            if !linked {
                return Err(TreeError::GroupLink { group: group.0 });
            }
        }

        for node in 0..nodes {
            let child = tree.first_children[node];
            if child == NULL {
                continue;
            }

            let linked = child > 0
                && child < nodes
                && (child - 1) % Self::NUM_CHILDREN == 0
                && !tree.is_free(Self::sibling_group(NodeIndex(node)))
                && tree.parents[Self::sibling_group(NodeIndex(child)).0] == node;

            if !linked {
                return Err(TreeError::ChildLink { node });
            }
        }

        let found = Self::num_nodes(tree.sibling_groups().count());
        if found != tree.size {
            return Err(TreeError::Size {
                size: tree.size,
                found,
            });
        }

        let mut reachable = 0;
        let mut stack = vec![NodeIndex::ROOT];
        while let Some(node) = stack.pop() {
            reachable += 1;
            if reachable > tree.size {
                break;
            }
            stack.extend(tree.children(node));
        }

        if reachable != tree.size {
            return Err(TreeError::Unreachable {
                size: tree.size,
                reachable,
            });
        }

        let expected = (1..groups)
            .find(|&group| tree.parents[group] == NULL)
            .unwrap_or(groups);
        if tree.first_free_group != expected {
            return Err(TreeError::FirstFreeGroup {
                found: tree.first_free_group,
                expected,
            });
        }

        Ok(tree)
    }
}

/// Graph equality: two trees are equal if their parent-child graphs are the same.
impl<const N: usize> PartialEq for Tree<N> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }

        self.nodes().zip(other.nodes()).all(|(a, b)| {
            self.parent(a) == other.parent(b) && self.children(a).eq(other.children(b))
        })
    }
}

impl<const N: usize> Eq for Tree<N> {}

impl<const N: usize> DataSize for Tree<N> {
    const IS_DYNAMIC: bool = true;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        self.parents.estimate_heap_size() + self.first_children.estimate_heap_size()
    }
}
