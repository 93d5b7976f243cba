//! Adaptive mesh refinement.
//!
//! Nodes of an [`AmrTarget`] are tagged with [`Action`]s by a user supplied predicate,
//! the actions are relaxed until refining and coarsening keeps neighboring leaves within
//! one level of each other, and finally the surviving actions are committed to the
//! target.

mod action;
mod config;
pub mod criterion;
mod state;
mod target;

pub use action::{Action, NodeAction};
pub use config::{AmrConfig, ConfigError};
pub use state::{AmrError, AmrState, ApplyResult};
pub use target::AmrTarget;
