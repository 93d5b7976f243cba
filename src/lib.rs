#![allow(clippy::needless_range_loop)]

//! Adaptive refinement of `N`-dimensional hypertrees (binary trees, quadtrees,
//! octrees, ...) which keeps neighboring leaves within one level of each other.

pub mod amr;
pub mod geometry;
pub mod grid;
pub mod tree;

/// Provides common types used by most `hypertree` applications.
pub mod prelude {
    pub use crate::amr::{
        Action, AmrConfig, AmrError, AmrState, AmrTarget, ApplyResult, ConfigError, NodeAction,
    };
    pub use crate::geometry::{AxisMask, Face, Rectangle, Region};
    pub use crate::grid::Grid;
    pub use crate::tree::{Location, NodeIndex, SiblingGroupIndex, Tree, TreeError};
}
