use serde::{Deserialize, Serialize};

/// Refinement decision for a single node. Variants are ordered by strength,
/// `Coarsen < Keep < Refine`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Action {
    /// Merge the node (and all of its siblings) into the parent.
    Coarsen,
    /// Leave the node as is.
    #[default]
    Keep,
    /// Split the node into a full group of children.
    Refine,
}

impl Action {
    /// Combines two requests for the same node. The strongest request wins.
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }
}

/// A tracked node and the action currently assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAction<I> {
    pub node: I,
    pub action: Action,
}

impl<I> datasize::DataSize for NodeAction<I> {
    const IS_DYNAMIC: bool = false;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine() {
        assert_eq!(Action::default(), Action::Keep);
        assert_eq!(Action::Coarsen.combine(Action::Keep), Action::Keep);
        assert_eq!(Action::Refine.combine(Action::Coarsen), Action::Refine);
        assert_eq!(Action::Keep.combine(Action::Refine), Action::Refine);
        assert_eq!(Action::Coarsen.combine(Action::Coarsen), Action::Coarsen);
    }
}
