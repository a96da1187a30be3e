//! Optimal binary-search-tree layout.
//!
//! Restricts layouts to search trees over the index order `0..n` and finds
//! the cheapest one exactly with an interval dynamic program. Each subtree
//! covers a contiguous interval `[i, j]`; the edge from its root to the
//! parent is crossed by all demand between the interval and the rest, so
//!
//! ```text
//! cost(i, j) = min_x  cost(i, x-1) + agg(i, x-1) + cost(x+1, j) + agg(x+1, j)
//! ```
//!
//! where `agg(i, j)` is the symmetric demand leaving `[i, j]`. O(n³) time,
//! O(n²) memory.
//!
//! Run it on [`DemandMatrix::reordered`] to search over trees consistent
//! with a bisection ordering instead of the identity.
//!
//! # References
//!
//! - Knuth (1971), "Optimum binary search trees"

use crate::error::{Error, Result};
use crate::tree::{DemandMatrix, TreeLayout};
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// `agg[i][j]`: symmetric demand between vertices in `[i, j]` and vertices
/// outside it. Entries with `i > j` are zero.
///
/// Built from per-row prefix sums so that each interval term is O(1).
pub fn aggregate_demand(demand: &DemandMatrix) -> Vec<Vec<f64>> {
    let n = demand.len();

    // prefix[k][m] = Σ_{m' < m} w(k, m')
    let prefix: Vec<Vec<f64>> = (0..n)
        .map(|k| {
            let mut row = Vec::with_capacity(n + 1);
            let mut acc = 0.0;
            row.push(acc);
            for m in 0..n {
                acc += demand.symmetric(k, m);
                row.push(acc);
            }
            row
        })
        .collect();

    let mut agg = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            agg[i][j] = (i..=j)
                .map(|k| prefix[k][i] + prefix[k][n] - prefix[k][j + 1])
                .sum();
        }
    }
    agg
}

/// Best root and subtree cost of one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub cost: f64,
    pub root: usize,
}

/// Solved interval table: best root and cost for every `[i, j]`, `i ≤ j`.
#[derive(Debug, Clone)]
pub struct IntervalTable {
    n: usize,
    cells: Vec<Interval>,
}

impl IntervalTable {
    /// Runs the interval DP over an aggregate-demand table.
    ///
    /// Ties go to the lowest root.
    pub fn solve(agg: &[Vec<f64>]) -> Self {
        let n = agg.len();
        let unset = Interval {
            cost: f64::INFINITY,
            root: usize::MAX,
        };
        let mut table = Self {
            n,
            cells: vec![unset; n * n],
        };

        for v in 0..n {
            table.cells[v * n + v] = Interval { cost: 0.0, root: v };
        }

        for span in 1..n {
            for i in 0..n - span {
                let j = i + span;
                let mut best = unset;
                for x in i..=j {
                    let mut cost = 0.0;
                    if x != j {
                        cost += table.get(x + 1, j).cost + agg[x + 1][j];
                    }
                    if x != i {
                        cost += table.get(i, x - 1).cost + agg[i][x - 1];
                    }
                    if cost < best.cost {
                        best = Interval { cost, root: x };
                    }
                }
                table.cells[i * n + j] = best;
            }
        }

        table
    }

    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the table covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Solution for `[i, j]`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Interval {
        debug_assert!(i <= j && j < self.n);
        self.cells[i * self.n + j]
    }

    /// Cost of the whole range.
    pub fn total_cost(&self) -> Option<f64> {
        (self.n > 0).then(|| self.get(0, self.n - 1).cost)
    }

    /// Rebuilds the tree breadth-first from `[0, n-1]`.
    pub fn layout(&self) -> TreeLayout {
        let mut parents = vec![None; self.n];
        if self.n == 0 {
            return TreeLayout::from_parents(parents);
        }

        let mut queue = VecDeque::from([(None, 0, self.n - 1)]);
        while let Some((parent, lo, hi)) = queue.pop_front() {
            let root = self.get(lo, hi).root;
            parents[root] = parent;
            if root != lo {
                queue.push_back((Some(root), lo, root - 1));
            }
            if root != hi {
                queue.push_back((Some(root), root + 1, hi));
            }
        }
        TreeLayout::from_parents(parents)
    }
}

/// Cheapest search tree over the vertex order `0..n`.
///
/// Returns the tree's cost together with the layout; the cost equals
/// [`cost`](crate::tree::cost) of the layout up to rounding.
///
/// # Errors
/// - [`Error::Precondition`] for an empty matrix.
/// - [`Error::InvariantViolation`] if the reconstructed tree is invalid.
///
/// # Examples
///
/// ```
/// use treelayout::obst::solve_optimal_bst;
/// use treelayout::tree::{cost, DemandMatrix};
///
/// let demand = DemandMatrix::from_queries(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]).unwrap();
/// let (dp_cost, layout) = solve_optimal_bst(&demand).unwrap();
/// assert!(layout.validate());
/// assert!((cost(&layout, &demand).unwrap() - dp_cost).abs() < 1e-9);
/// ```
#[instrument(level = "debug", skip_all, fields(n = demand.len()))]
pub fn solve_optimal_bst(demand: &DemandMatrix) -> Result<(f64, TreeLayout)> {
    let n = demand.len();
    if n == 0 {
        return Err(Error::Precondition("empty demand matrix".into()));
    }

    let table = IntervalTable::solve(&aggregate_demand(demand));
    let layout = table.layout();
    if !layout.validate() {
        return Err(Error::InvariantViolation(format!(
            "optimal BST reconstruction produced an invalid tree: {:?}",
            layout.parents()
        )));
    }

    let total = table.get(0, n - 1).cost;
    debug!(cost = total, root = table.get(0, n - 1).root, "optimal BST solved");
    Ok((total, layout))
}
