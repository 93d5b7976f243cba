use datasize::DataSize;
use log::Level;
use std::convert::Infallible;
use thiserror::Error;

use super::{Action, AmrConfig, AmrTarget, ConfigError, NodeAction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmrError {
    #[error("2:1 balancing did not converge within {iterations} iterations")]
    BalanceNotConverged { iterations: usize },
}

/// Outcome of committing actions to a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyResult {
    /// Whether the structure of the target changed at all.
    pub target_changed: bool,
    /// Number of nodes which were refined.
    pub num_refined: usize,
    /// Number of sibling groups which were coarsened.
    pub num_coarsened: usize,
}

/// Binary search for the slot of a tracked node.
fn position<I: Ord>(data: &[NodeAction<I>], node: I) -> Option<usize> {
    data.binary_search_by(|entry| entry.node.cmp(&node)).ok()
}

/// Computes refinement actions for the nodes of a target, balances them so that
/// neighboring leaves never differ by more than one level, and applies them.
///
/// Actions are stored in a vector sorted by node, which is rebuilt by every call to
/// [`AmrState::compute_actions`] and consumed by [`AmrState::apply`].
#[derive(Debug)]
pub struct AmrState<T: AmrTarget> {
    target: T,
    data: Vec<NodeAction<T::Node>>,
    config: AmrConfig,
    /// Set once actions have been computed for the current structure of the target.
    computed: bool,
}

impl<T: AmrTarget> AmrState<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            data: Vec::new(),
            config: AmrConfig::default(),
            computed: false,
        }
    }

    /// Creates a state using the given config, which is validated first.
    pub fn with_config(target: T, config: AmrConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            ..Self::new(target)
        })
    }

    pub fn config(&self) -> &AmrConfig {
        &self.config
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable access to the target. Any computed actions are discarded.
    pub fn target_mut(&mut self) -> &mut T {
        self.data.clear();
        self.computed = false;
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Tracked nodes and their actions, sorted by node.
    pub fn data(&self) -> &[NodeAction<T::Node>] {
        &self.data
    }

    /// Iterates all tracked nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = T::Node> + '_ {
        self.data.iter().map(|entry| entry.node)
    }

    pub fn find(&self, node: T::Node) -> Option<&NodeAction<T::Node>> {
        position(&self.data, node).map(|slot| &self.data[slot])
    }

    pub fn find_mut(&mut self, node: T::Node) -> Option<&mut NodeAction<T::Node>> {
        position(&self.data, node).map(|slot| &mut self.data[slot])
    }

    /// Number of tracked nodes currently assigned the given action.
    pub fn count(&self, action: Action) -> usize {
        self.data
            .iter()
            .filter(|entry| entry.action == action)
            .count()
    }

    /// Slots of the tracked siblings of `node` (including `node` itself).
    fn tracked_siblings(&self, node: T::Node) -> Vec<usize> {
        self.target
            .siblings(node)
            .filter_map(|sibling| position(&self.data, sibling))
            .collect()
    }

    /// Slots of the tracked neighbors of `node`.
    fn tracked_neighbors(&self, node: T::Node) -> Vec<usize> {
        self.target
            .neighbors(node)
            .filter_map(|neighbor| position(&self.data, neighbor))
            .collect()
    }

    fn set_all(&mut self, slots: &[usize], action: Action) {
        for &slot in slots {
            self.data[slot].action = action;
        }
    }

    /// Evaluates `predicate` for every node of the target, replacing any previously
    /// computed actions.
    pub fn compute_actions(&mut self, mut predicate: impl FnMut(&T, T::Node) -> Action) {
        let result = self.try_compute_actions(|target, node| {
            Ok::<Action, Infallible>(predicate(target, node))
        });

        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Fallible version of [`AmrState::compute_actions`]. The first error returned by
    /// `predicate` is passed on unchanged, leaving the state without actions.
    pub fn try_compute_actions<E>(
        &mut self,
        mut predicate: impl FnMut(&T, T::Node) -> Result<Action, E>,
    ) -> Result<(), E> {
        self.data.clear();
        self.computed = false;

        for node in self.target.nodes() {
            match predicate(&self.target, node) {
                Ok(action) => self.data.push(NodeAction { node, action }),
                Err(error) => {
                    self.data.clear();
                    return Err(error);
                }
            }
        }

        self.data.sort_unstable_by(|a, b| a.node.cmp(&b.node));
        debug_assert!(
            self.data.windows(2).all(|w| w[0].node != w[1].node),
            "target yielded duplicate nodes"
        );

        self.limit_level_range();
        self.computed = true;

        Ok(())
    }

    /// Disables refinement at or above the maximum level and coarsening at or below
    /// the minimum level.
    fn limit_level_range(&mut self) {
        let AmrConfig {
            min_level,
            max_level,
            ..
        } = self.config;

        for entry in self.data.iter_mut() {
            let level = self.target.level(entry.node);

            if entry.action == Action::Refine && max_level.is_some_and(|max| level >= max) {
                entry.action = Action::Keep;
            }

            if entry.action == Action::Coarsen && min_level.is_some_and(|min| level <= min) {
                entry.action = Action::Keep;
            }
        }
    }

    /// Performs one relaxation pass of 2:1 balancing. Returns `true` if no action
    /// had to be changed, i.e. the actions are already balanced.
    pub fn enforce_2_to_1_ratio_step(&mut self) -> bool {
        let mut done = true;
        let num_siblings = self.target.num_siblings();

        // Only complete sibling groups can be coarsened.
        for slot in 0..self.data.len() {
            if self.data[slot].action != Action::Coarsen {
                continue;
            }

            let siblings = self.tracked_siblings(self.data[slot].node);
            let complete = siblings.len() == num_siblings
                && siblings
                    .iter()
                    .all(|&sibling| self.data[sibling].action == Action::Coarsen);

            if complete {
                continue;
            }

            for sibling in siblings {
                if self.data[sibling].action == Action::Coarsen {
                    self.data[sibling].action = Action::Keep;
                    done = false;
                }
            }
        }

        // A group can not coarsen next to a refining node on the same level, or next to
        // a finer node which does not coarsen itself.
        for slot in 0..self.data.len() {
            if self.data[slot].action != Action::Coarsen {
                continue;
            }

            let node = self.data[slot].node;
            let level = self.target.level(node);
            let siblings = self.tracked_siblings(node);

            debug_assert!(siblings
                .iter()
                .all(|&sibling| self.data[sibling].action == Action::Coarsen));

            let conflict = siblings.iter().any(|&sibling| {
                self.tracked_neighbors(self.data[sibling].node)
                    .into_iter()
                    .any(|neighbor| {
                        let entry = self.data[neighbor];
                        let neighbor_level = self.target.level(entry.node);

                        (neighbor_level == level && entry.action == Action::Refine)
                            || (neighbor_level == level + 1 && entry.action != Action::Coarsen)
                    })
            });

            if conflict {
                self.set_all(&siblings, Action::Keep);
                done = false;
            }
        }

        // Refining a node forces coarser neighbors (and their siblings) to refine as well.
        for slot in 0..self.data.len() {
            if self.data[slot].action != Action::Refine {
                continue;
            }

            let node = self.data[slot].node;
            let level = self.target.level(node);

            for neighbor in self.tracked_neighbors(node) {
                let entry = self.data[neighbor];

                if self.target.level(entry.node) >= level || entry.action == Action::Refine {
                    continue;
                }

                let siblings = self.tracked_siblings(entry.node);
                self.data[neighbor].action = Action::Refine;
                self.set_all(&siblings, Action::Refine);
                done = false;
            }
        }

        done
    }

    /// Runs balancing passes until a fixed point is reached, returning the number of
    /// passes performed.
    pub fn enforce_2_to_1_ratio(&mut self) -> Result<usize, AmrError> {
        self.enforce_2_to_1_ratio_with(|_| {})
    }

    /// Same as [`AmrState::enforce_2_to_1_ratio`], invoking `callback` before every pass.
    pub fn enforce_2_to_1_ratio_with(
        &mut self,
        mut callback: impl FnMut(&Self),
    ) -> Result<usize, AmrError> {
        let limit = self.config.iteration_limit(self.data.len());
        let mut iterations = 0;

        loop {
            self.target.log(
                Level::Trace,
                format_args!(
                    "amr iteration: {iterations}, refine: {}, coarsen: {}",
                    self.count(Action::Refine),
                    self.count(Action::Coarsen)
                ),
            );

            callback(self);

            if iterations >= limit {
                return Err(AmrError::BalanceNotConverged { iterations });
            }

            iterations += 1;
            let done = self.enforce_2_to_1_ratio_step();

            self.target.log(
                Level::Trace,
                format_args!("after step {iterations} done = {done}"),
            );

            if done {
                return Ok(iterations);
            }
        }
    }

    /// Commits the computed actions to the target: first all coarsenings, then all
    /// refinements. The actions are consumed, so `compute_actions` must be called
    /// again before the next `apply`.
    ///
    /// # Panics
    /// If no actions have been computed for the current structure of the target.
    pub fn apply(&mut self) -> ApplyResult {
        assert!(
            self.computed,
            "actions must be computed before they can be applied"
        );
        self.computed = false;

        // Pick one representative per coarsening group.
        let mut to_coarsen = Vec::new();
        for slot in 0..self.data.len() {
            if self.data[slot].action != Action::Coarsen {
                continue;
            }

            let node = self.data[slot].node;
            let siblings = self.tracked_siblings(node);
            self.set_all(&siblings, Action::Keep);
            to_coarsen.push(node);
        }

        let to_refine = self
            .data
            .iter()
            .filter(|entry| entry.action == Action::Refine)
            .map(|entry| entry.node)
            .collect::<Vec<_>>();

        self.data.clear();

        for &node in &to_coarsen {
            self.target.coarsen_siblings_of(node);
        }

        for &node in &to_refine {
            self.target.refine(node);
        }

        ApplyResult {
            target_changed: !to_coarsen.is_empty() || !to_refine.is_empty(),
            num_refined: to_refine.len(),
            num_coarsened: to_coarsen.len(),
        }
    }

    /// Runs a complete adaptation cycle. Returns whether the target changed.
    pub fn adapt(&mut self, predicate: impl FnMut(&T, T::Node) -> Action) -> Result<bool, AmrError> {
        self.adapt_with(predicate, |_| {})
    }

    /// Runs a complete adaptation cycle, invoking `callback` before every balancing pass.
    pub fn adapt_with(
        &mut self,
        mut predicate: impl FnMut(&T, T::Node) -> Action,
        callback: impl FnMut(&Self),
    ) -> Result<bool, AmrError> {
        self.try_adapt_with(
            |target, node| Ok::<Action, AmrError>(predicate(target, node)),
            callback,
        )
    }

    /// Fallible version of [`AmrState::adapt_with`], passing on errors of `predicate`.
    pub fn try_adapt_with<E: From<AmrError>>(
        &mut self,
        predicate: impl FnMut(&T, T::Node) -> Result<Action, E>,
        callback: impl FnMut(&Self),
    ) -> Result<bool, E> {
        let leaves_before = self.target.nodes().count();

        self.try_compute_actions(predicate)?;
        let iterations = self.enforce_2_to_1_ratio_with(callback)?;

        self.target.log(
            Level::Debug,
            format_args!(
                "amr tracked {} nodes using {} bytes",
                self.data.len(),
                self.data.estimate_heap_size()
            ),
        );

        let result = self.apply();
        let leaves_after = self.target.nodes().count();

        self.target.log(
            Level::Info,
            format_args!(
                "amr: target changed = {}, leaves {} -> {}, refined {}, coarsened {} groups, {} iterations",
                result.target_changed,
                leaves_before,
                leaves_after,
                result.num_refined,
                result.num_coarsened,
                iterations
            ),
        );

        Ok(result.target_changed)
    }
}

impl<T: AmrTarget + DataSize> DataSize for AmrState<T> {
    const IS_DYNAMIC: bool = true;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        self.target.estimate_heap_size() + self.data.estimate_heap_size()
    }
}
