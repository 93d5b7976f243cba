use crate::geometry::{regions, Face, Region};

use super::{Location, NodeIndex, Tree};

impl<const N: usize> Tree<N> {
    /// Computes the location code of a node by walking up to the root.
    pub fn location(&self, node: NodeIndex) -> Location<N> {
        let mut splits = Vec::new();
        let mut cursor = node;

        while let Some(parent) = self.parent(cursor) {
            splits.push(Self::position_in_parent(cursor));
            cursor = parent;
        }

        let mut result = Location::root();
        for split in splits.into_iter().rev() {
            result.push(split);
        }
        result
    }

    /// Finds the node at exactly the given location, if it exists.
    pub fn node_at(&self, location: &Location<N>) -> Option<NodeIndex> {
        let node = self.node_or_ancestor_at(location);
        (self.level(node) == location.level()).then_some(node)
    }

    /// Finds the node at the given location, or its deepest existing ancestor.
    pub fn node_or_ancestor_at(&self, location: &Location<N>) -> NodeIndex {
        let mut node = NodeIndex::ROOT;

        for split in location.splits() {
            match self.child(node, split) {
                Some(child) => node = child,
                None => break,
            }
        }

        node
    }

    /// The node on the same level across the given face, if it exists.
    pub fn neighbor(&self, node: NodeIndex, face: Face<N>) -> Option<NodeIndex> {
        let location = self.location(node).shifted(face.offset())?;
        self.node_at(&location)
    }

    /// All neighbors of a node across faces, edges and corners, sorted by index.
    ///
    /// For each direction this is the node on the same level if it is a leaf, the
    /// coarser leaf covering that position, or the children of the same level node
    /// which touch `node`.
    pub fn neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let location = self.location(node);
        let level = location.level();

        let mut result = Vec::new();

        for region in regions::<N>().filter(|&region| region != Region::CENTRAL) {
            let Some(target) = location.shifted(region.offset_dir()) else {
                continue;
            };

            let found = self.node_or_ancestor_at(&target);

            if self.is_leaf(found) || self.level(found) < level {
                result.push(found);
                continue;
            }

            result.extend(
                region
                    .reverse()
                    .adjacent_splits()
                    .filter_map(|split| self.child(found, split)),
            );
        }

        result.sort_unstable();
        result.dedup();
        result
    }

    /// Checks that every leaf borders only leaves which differ by at most one level.
    pub fn is_balanced(&self) -> bool {
        self.leaves().all(|leaf| {
            let level = self.level(leaf);
            self.neighbors(leaf).into_iter().all(|neighbor| {
                self.is_leaf(neighbor) && self.level(neighbor).abs_diff(level) <= 1
            })
        })
    }
}
