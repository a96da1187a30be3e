//! Bisection-then-build pipelines.
//!
//! A bisection ordering places communicating vertices near each other; a
//! tree builder then turns the ordering into a layout. The builders that
//! work by index (optimal BST, greedy) run on the demand matrix re-indexed
//! by ordering position, and their layout is mapped back to vertex ids.

use crate::bisection::{reorder, OrderingLog, ReorderConfig};
use crate::error::{Error, Result};
use crate::greedy::greedy_build;
use crate::obst::solve_optimal_bst;
use crate::tree::{build_balanced, cost, DemandMatrix, TreeLayout};
use rand::Rng;
use tracing::{info, instrument};

/// Layout construction applied after reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TreeBuilder {
    /// Median-split balanced tree over the ordering.
    #[default]
    Balanced,
    /// Optimal search tree over the ordering.
    OptimalBst,
    /// Greedy insertion on the reordered demand.
    Greedy,
}

impl TreeBuilder {
    pub fn name(self) -> &'static str {
        match self {
            TreeBuilder::Balanced => "balanced",
            TreeBuilder::OptimalBst => "obst",
            TreeBuilder::Greedy => "greedy",
        }
    }
}

/// Summary of an [`OrderingLog`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderingMetrics {
    pub max_iteration_hits: usize,
    pub average_iterations: f64,
    pub average_swapped_pairs: f64,
    pub average_cost_gain: f64,
}

impl From<&OrderingLog> for OrderingMetrics {
    fn from(log: &OrderingLog) -> Self {
        Self {
            max_iteration_hits: log.max_iteration_hits(),
            average_iterations: log.average_iterations(),
            average_swapped_pairs: log.average_swapped_pairs(),
            average_cost_gain: log.average_cost_gain(),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Vertex ordering produced by the bisection.
    pub ordering: Vec<usize>,
    /// Layout over the original vertex ids.
    pub layout: TreeLayout,
    /// Demand-weighted cost of `layout`.
    pub cost: f64,
    /// Reordering diagnostics.
    pub metrics: OrderingMetrics,
}

/// Maps a layout over ordering positions back to vertex ids.
///
/// Position `i` holds vertex `ordering[i]`.
pub fn relabel(positional: &TreeLayout, ordering: &[usize]) -> Result<TreeLayout> {
    let n = ordering.len();
    if positional.len() != n {
        return Err(Error::Precondition(format!(
            "layout has {} vertices, ordering has {n}",
            positional.len()
        )));
    }
    let mut parents = vec![None; n];
    for (pos, &vertex) in ordering.iter().enumerate() {
        if vertex >= n {
            return Err(Error::Precondition(format!(
                "ordering entry {vertex} out of range for {n} vertices"
            )));
        }
        parents[vertex] = positional.parent(pos).map(|p| ordering[p]);
    }
    Ok(TreeLayout::from_parents(parents))
}

/// Reorders the identity permutation with `config`, then builds a layout.
///
/// # Errors
/// Propagates errors from the reorderer and the builders.
///
/// # Examples
///
/// ```
/// use treelayout::bisection::ReorderConfig;
/// use treelayout::pipeline::{reorder_and_build, TreeBuilder};
/// use treelayout::random::create_rng;
/// use treelayout::tree::DemandMatrix;
///
/// let demand = DemandMatrix::from_queries(6, &[(0, 5), (1, 4), (2, 3), (0, 5)]).unwrap();
/// let report = reorder_and_build(
///     &demand,
///     &ReorderConfig::default(),
///     TreeBuilder::OptimalBst,
///     &mut create_rng(1),
/// )
/// .unwrap();
/// assert!(report.layout.validate());
/// ```
#[instrument(level = "debug", skip_all, fields(n = demand.len(), builder = builder.name()))]
pub fn reorder_and_build<R: Rng>(
    demand: &DemandMatrix,
    config: &ReorderConfig,
    builder: TreeBuilder,
    rng: &mut R,
) -> Result<PipelineReport> {
    let n = demand.len();
    if n == 0 {
        return Err(Error::Precondition("empty demand matrix".into()));
    }

    let mut ordering: Vec<usize> = (0..n).collect();
    let mut log = OrderingLog::new(config.max_iterations);
    reorder(demand, &mut ordering, 0..n, config, Some(&mut log))?;

    let layout = match builder {
        TreeBuilder::Balanced => build_balanced(&ordering),
        TreeBuilder::OptimalBst => {
            let (_, positional) = solve_optimal_bst(&demand.reordered(&ordering)?)?;
            relabel(&positional, &ordering)?
        }
        TreeBuilder::Greedy => {
            let (_, positional) = greedy_build(&demand.reordered(&ordering)?, rng)?;
            relabel(&positional, &ordering)?
        }
    };
    let total = cost(&layout, demand)?;
    let metrics = OrderingMetrics::from(&log);
    info!(
        cost = total,
        strategy = %config.strategy,
        avg_iterations = metrics.average_iterations,
        "pipeline finished"
    );

    Ok(PipelineReport {
        ordering,
        layout,
        cost: total,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisection::GainStrategy;
    use crate::random::create_rng;

    fn random_demand(n: usize, seed: u64) -> DemandMatrix {
        let mut rng = create_rng(seed);
        let mut demand = DemandMatrix::zeros(n);
        for u in 0..n {
            for v in 0..n {
                if u != v && rng.random_bool(0.25) {
                    demand.set(u, v, rng.random_range(1..10) as f64).unwrap();
                }
            }
        }
        demand
    }

    #[test]
    fn test_relabel() {
        // positions: 1 is root with children 0 and 2
        let positional = TreeLayout::from_parents(vec![Some(1), None, Some(1)]);
        let layout = relabel(&positional, &[2, 0, 1]).unwrap();
        // vertex 2 at position 0, vertex 0 at 1 (root), vertex 1 at 2
        assert_eq!(layout.parents(), &[None, Some(0), Some(0)]);
        assert!(relabel(&positional, &[0, 1]).is_err());
    }

    #[test]
    fn test_obst_cost_preserved_by_relabel() {
        let demand = random_demand(12, 1);
        let ordering = vec![3, 7, 0, 11, 5, 1, 9, 2, 8, 4, 10, 6];
        let (dp_cost, positional) = solve_optimal_bst(&demand.reordered(&ordering).unwrap()).unwrap();
        let layout = relabel(&positional, &ordering).unwrap();
        assert!((cost(&layout, &demand).unwrap() - dp_cost).abs() < 1e-6);
    }

    #[test]
    fn test_every_builder_valid() {
        let demand = random_demand(20, 2);
        for builder in [TreeBuilder::Balanced, TreeBuilder::OptimalBst, TreeBuilder::Greedy] {
            for strategy in [GainStrategy::Basic, GainStrategy::OneHop] {
                let config = ReorderConfig::default().with_strategy(strategy);
                let report = reorder_and_build(&demand, &config, builder, &mut create_rng(3)).unwrap();
                assert!(report.layout.validate(), "{} / {strategy}", builder.name());
                assert!((cost(&report.layout, &demand).unwrap() - report.cost).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_obst_never_worse_than_balanced() {
        for seed in 0..10 {
            let demand = random_demand(16, seed);
            let config = ReorderConfig::default();
            let balanced =
                reorder_and_build(&demand, &config, TreeBuilder::Balanced, &mut create_rng(seed)).unwrap();
            let obst =
                reorder_and_build(&demand, &config, TreeBuilder::OptimalBst, &mut create_rng(seed)).unwrap();
            assert_eq!(balanced.ordering, obst.ordering);
            assert!(obst.cost <= balanced.cost + 1e-6, "seed {seed}");
        }
    }

    #[test]
    fn test_metrics_filled() {
        let demand = random_demand(16, 4);
        let report = reorder_and_build(
            &demand,
            &ReorderConfig::default(),
            TreeBuilder::Balanced,
            &mut create_rng(4),
        )
        .unwrap();
        assert!(report.metrics.average_iterations >= 1.0);
    }
}
