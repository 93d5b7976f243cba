use super::{NodeIndex, SiblingGroupIndex, Tree, NULL};

impl<const N: usize> Tree<N> {
    /// Swaps the storage location of two sibling groups, updating all parent and
    /// child links which point into them. Either group may be free, but not both,
    /// and neither may be the root group.
    pub fn swap(&mut self, a: SiblingGroupIndex, b: SiblingGroupIndex) {
        assert!(
            a != SiblingGroupIndex::ROOT && b != SiblingGroupIndex::ROOT,
            "the root sibling group cannot be swapped"
        );
        assert!(a != b, "sibling group {} cannot be swapped with itself", a.0);

        if self.is_free(a) && self.is_free(b) {
            return;
        }

        // Children links, and the parent links of the groups below.
        for (l, r) in Self::group_nodes(a).zip(Self::group_nodes(b)) {
            self.first_children.swap(l, r);
            self.relink_children(NodeIndex(l));
            self.relink_children(NodeIndex(r));
        }

        // Parent links of the swapped groups.
        let parent_a = self.parents[a.0];
        let parent_b = self.parents[b.0];
        self.relink_parent(parent_a, b);
        self.relink_parent(parent_b, a);

        let lowest = a.0.min(b.0);
        if self.first_free_group >= lowest {
            self.first_free_group = (lowest..self.sibling_group_capacity())
                .find(|&group| self.is_free(SiblingGroupIndex(group)))
                .unwrap_or(self.sibling_group_capacity());
        }
    }

    fn relink_children(&mut self, node: NodeIndex) {
        if let Some(group) = self.children_group(node) {
            self.parents[group.0] = node.0;
        }
    }

    fn relink_parent(&mut self, parent: usize, group: SiblingGroupIndex) {
        if parent != NULL {
            self.first_children[parent] = Self::first_node(group).0;
        }
        self.parents[group.0] = parent;
    }

    /// Sorts the tree in depth-first order, with the siblings of each group in
    /// Morton z-order. Afterwards the tree is compact.
    ///
    /// `data_swap` is invoked for every pair of nodes whose storage is exchanged,
    /// so that data associated with nodes can be kept in sync.
    pub fn dfs_sort(&mut self, mut data_swap: impl FnMut(NodeIndex, NodeIndex)) {
        self.sort_group(SiblingGroupIndex::ROOT, &mut data_swap);
        self.first_free_group = Self::num_sibling_groups(self.size);

        debug_assert!(self.is_compact());
        debug_assert!(self.is_dfs_sorted());
    }

    /// Sorts the subtree below `group`, assuming `group` already lies at its
    /// final position. Returns the last sibling group used by the subtree.
    fn sort_group(
        &mut self,
        group: SiblingGroupIndex,
        data_swap: &mut impl FnMut(NodeIndex, NodeIndex),
    ) -> SiblingGroupIndex {
        let mut expected = group;

        for node in Self::group_nodes(group).map(NodeIndex) {
            let Some(children) = self.children_group(node) else {
                continue;
            };

            expected = SiblingGroupIndex(expected.0 + 1);

            if children != expected {
                self.swap(children, expected);
                for (l, r) in Self::group_nodes(children).zip(Self::group_nodes(expected)) {
                    data_swap(NodeIndex(l), NodeIndex(r));
                }
            }

            expected = self.sort_group(expected, data_swap);
        }

        expected
    }

    /// Is the tree stored in depth-first order?
    pub fn is_dfs_sorted(&self) -> bool {
        self.sorted_until(SiblingGroupIndex::ROOT).is_some()
    }

    fn sorted_until(&self, group: SiblingGroupIndex) -> Option<SiblingGroupIndex> {
        let mut expected = group;

        for node in Self::group_nodes(group).map(NodeIndex) {
            let Some(children) = self.children_group(node) else {
                continue;
            };

            expected = SiblingGroupIndex(expected.0 + 1);
            if children != expected {
                return None;
            }
            expected = self.sorted_until(children)?;
        }

        Some(expected)
    }
}
