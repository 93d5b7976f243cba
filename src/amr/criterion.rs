//! Refinement criteria based on the distance of a node to a boundary, described by
//! a signed distance function.

use crate::amr::Action;
use crate::grid::Grid;
use crate::tree::NodeIndex;

/// Decides the action of a grid node given a signed distance function.
pub trait Criterion<const N: usize> {
    fn action<F: Fn([f64; N]) -> f64>(&self, grid: &Grid<N>, distance: &F, node: NodeIndex)
        -> Action;
}

/// Enforces `target_level` for all nodes whose center lies closer than
/// `target_distance` to the boundary. Nodes farther away are coarsened.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LevelTillDistance {
    pub target_distance: f64,
    pub target_level: usize,
}

impl LevelTillDistance {
    pub fn new(target_distance: f64, target_level: usize) -> Self {
        Self {
            target_distance,
            target_level,
        }
    }
}

impl<const N: usize> Criterion<N> for LevelTillDistance {
    fn action<F: Fn([f64; N]) -> f64>(
        &self,
        grid: &Grid<N>,
        distance: &F,
        node: NodeIndex,
    ) -> Action {
        let level = grid.tree().level(node);

        if distance(grid.center(node)).abs() >= self.target_distance {
            return Action::Coarsen;
        }

        match level.cmp(&self.target_level) {
            std::cmp::Ordering::Less => Action::Refine,
            std::cmp::Ordering::Equal => Action::Keep,
            std::cmp::Ordering::Greater => Action::Coarsen,
        }
    }
}

/// Combines several criteria, the strongest request wins.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Multiple<C> {
    pub steps: Vec<C>,
}

impl<const N: usize, C: Criterion<N>> Criterion<N> for Multiple<C> {
    fn action<F: Fn([f64; N]) -> f64>(
        &self,
        grid: &Grid<N>,
        distance: &F,
        node: NodeIndex,
    ) -> Action {
        self.steps.iter().fold(Action::Coarsen, |acc, step| {
            acc.combine(step.action(grid, distance, node))
        })
    }
}

/// Surrounds the boundary with bands of nodes on decreasing levels. Each step
/// `(cells, level)` asks for a band `cells` nodes of `level` wide, measured from
/// the outer edge of the band on the next finer level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTillCellDistances {
    inner: Multiple<LevelTillDistance>,
}

impl LevelTillCellDistances {
    pub fn new<const N: usize>(
        grid: &Grid<N>,
        steps: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut steps = steps.into_iter().collect::<Vec<_>>();
        steps.sort_by(|a, b| b.1.cmp(&a.1));

        let mut distance = 0.0;
        let steps = steps
            .into_iter()
            .map(|(cells, level)| {
                distance += cells as f64 * grid.length(level);
                LevelTillDistance::new(distance, level)
            })
            .collect();

        Self {
            inner: Multiple { steps },
        }
    }

    pub fn steps(&self) -> &[LevelTillDistance] {
        &self.inner.steps
    }
}

impl<const N: usize> Criterion<N> for LevelTillCellDistances {
    fn action<F: Fn([f64; N]) -> f64>(
        &self,
        grid: &Grid<N>,
        distance: &F,
        node: NodeIndex,
    ) -> Action {
        self.inner.action(grid, distance, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amr::AmrState;
    use crate::geometry::Rectangle;

    fn circle(point: [f64; 2]) -> f64 {
        let dx = point[0] - 0.5;
        let dy = point[1] - 0.5;
        (dx * dx + dy * dy).sqrt() - 0.25
    }

    #[test]
    fn level_till_distance() {
        let grid = Grid::<1>::uniform(Rectangle::UNIT, 2, 0);
        let criterion = LevelTillDistance::new(0.3, 1);
        let distance = |point: [f64; 1]| point[0];

        // Center of node 1 lies at 0.25.
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(1)), Action::Keep);
        assert_eq!(criterion.action(&grid, &distance, NodeIndex::ROOT), Action::Coarsen);
        // Center of node 3 lies at 0.125, but its level is too fine.
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(3)), Action::Coarsen);

        let criterion = LevelTillDistance::new(0.3, 3);
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(3)), Action::Refine);
    }

    #[test]
    fn multiple_steps() {
        let grid = Grid::<1>::uniform(Rectangle::UNIT, 2, 0);
        let distance = |point: [f64; 1]| point[0];

        let criterion = Multiple {
            steps: vec![LevelTillDistance::new(0.2, 2), LevelTillDistance::new(0.7, 1)],
        };

        // Close nodes keep level 2, nodes up to 0.7 away keep level 1.
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(3)), Action::Keep);
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(5)), Action::Coarsen);
        assert_eq!(criterion.action(&grid, &distance, NodeIndex(1)), Action::Keep);
        assert_eq!(criterion.action(&grid, &distance, NodeIndex::ROOT), Action::Refine);

        let empty = Multiple::<LevelTillDistance> { steps: Vec::new() };
        assert_eq!(empty.action(&grid, &distance, NodeIndex(1)), Action::Coarsen);
    }

    #[test]
    fn cell_distances() {
        let grid = Grid::<2>::uniform(Rectangle::UNIT, 1, 4);
        let criterion = LevelTillCellDistances::new(&grid, [(2, 3), (1, 5), (2, 4)]);

        let steps = criterion.steps();
        assert_eq!(
            steps.iter().map(|s| s.target_level).collect::<Vec<_>>(),
            vec![5, 4, 3]
        );
        assert!((steps[0].target_distance - 1.0 / 32.0).abs() < 1e-12);
        assert!((steps[1].target_distance - 5.0 / 32.0).abs() < 1e-12);
        assert!((steps[2].target_distance - 13.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn adapt_around_circle() -> eyre::Result<()> {
        let grid = Grid::<2>::uniform(Rectangle::UNIT, 2, 3);
        let criterion = LevelTillCellDistances::new(&grid, [(1, 4), (1, 3)]);

        let mut state = AmrState::new(grid);
        let mut cycles = 0;
        while state.adapt(|grid, node| criterion.action(grid, &circle, node))? {
            assert!(state.target().tree().is_balanced());
            cycles += 1;
            assert!(cycles < 8, "refinement around a fixed circle must settle");
        }
        assert!(cycles >= 2);

        let grid = state.target();
        let tree = grid.tree();
        let deepest = tree.leaves().filter(|&leaf| tree.level(leaf) == 4).collect::<Vec<_>>();
        assert!(!deepest.is_empty());

        for leaf in deepest {
            assert!(circle(grid.center(leaf)).abs() < 1.0 / 16.0 + 1.0 / 8.0);
        }

        Ok(())
    }
}
