//! Incremental greedy placement.

use crate::error::{Error, Result};
use crate::tree::{DemandMatrix, TreeLayout};
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::{debug, instrument};

/// An open slot holder in rank order: lowest `rank` first, then lowest
/// `tie`.
///
/// `rank` is the breadth-first depth of `vertex`, `free` its remaining child
/// slots (1 or 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedLeaf {
    pub rank: u32,
    pub tie: u64,
    pub vertex: usize,
    pub free: u8,
}

impl Ord for RankedLeaf {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the shallowest leaf pops first
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| other.tie.cmp(&self.tie))
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for RankedLeaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grows a tree one vertex at a time.
///
/// Every placed vertex knows its hop distance to every other placed vertex,
/// so the cost of attaching a new vertex under any open leaf is a single
/// pass over the placed set. The accumulated cost always equals the
/// demand-weighted cost of the partial tree.
///
/// # Examples
///
/// ```
/// use treelayout::greedy::GreedyBuilder;
/// use treelayout::tree::DemandMatrix;
///
/// let demand = DemandMatrix::from_queries(3, &[(0, 1), (1, 2)]).unwrap();
/// let mut builder = GreedyBuilder::new(&demand);
/// builder.insert(1);
/// builder.insert(0);
/// builder.insert(2);
/// let (cost, layout) = builder.finish().unwrap();
/// assert_eq!(cost, 2.0);
/// assert_eq!(layout.root(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct GreedyBuilder<'a> {
    demand: &'a DemandMatrix,
    parents: Vec<Option<usize>>,
    placed: Vec<bool>,
    order: Vec<usize>,
    distances: Vec<u32>,
    open: BTreeMap<usize, u8>,
    rank: Vec<u32>,
    cost: f64,
}

impl<'a> GreedyBuilder<'a> {
    /// An empty builder over the vertices of `demand`.
    pub fn new(demand: &'a DemandMatrix) -> Self {
        let n = demand.len();
        Self {
            demand,
            parents: vec![None; n],
            placed: vec![false; n],
            order: Vec::with_capacity(n),
            distances: vec![0; n * n],
            open: BTreeMap::new(),
            rank: vec![u32::MAX; n],
            cost: 0.0,
        }
    }

    /// True once `v` has a position.
    pub fn is_placed(&self, v: usize) -> bool {
        self.placed[v]
    }

    /// Number of placed vertices.
    pub fn placed_count(&self) -> usize {
        self.order.len()
    }

    /// Accumulated cost of the partial tree.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Places `v` under the open leaf that minimizes its demand-weighted
    /// distance to everything already placed (ties to the lowest leaf id).
    ///
    /// The first vertex becomes the root; placed vertices are ignored.
    pub fn insert(&mut self, v: usize) {
        if self.placed[v] {
            return;
        }
        if self.order.is_empty() {
            self.place_root(v);
            return;
        }

        let n = self.parents.len();
        let mut best: Option<(f64, usize)> = None;
        for &leaf in self.open.keys() {
            let row = &self.distances[leaf * n..(leaf + 1) * n];
            let c: f64 = self
                .order
                .iter()
                .map(|&w| (row[w] + 1) as f64 * self.demand.symmetric(v, w))
                .sum();
            if best.map_or(true, |(min, _)| c < min) {
                best = Some((c, leaf));
            }
        }

        if let Some((_, leaf)) = best {
            self.attach(v, leaf);
        }
    }

    fn place_root(&mut self, v: usize) {
        self.parents[v] = None;
        self.placed[v] = true;
        self.order.push(v);
        self.rank[v] = 0;
        self.open.insert(v, 2);
    }

    /// Hangs `v` under `leaf`, which must hold a free slot.
    fn attach(&mut self, v: usize, leaf: usize) {
        let n = self.parents.len();
        match self.open.get_mut(&leaf) {
            Some(free) if *free > 1 => *free -= 1,
            _ => {
                self.open.remove(&leaf);
            }
        }

        self.parents[v] = Some(leaf);
        self.rank[v] = self.rank[leaf] + 1;
        for &w in &self.order {
            let d = self.distances[leaf * n + w] + 1;
            self.distances[v * n + w] = d;
            self.distances[w * n + v] = d;
            self.cost += d as f64 * self.demand.symmetric(v, w);
        }
        self.placed[v] = true;
        self.order.push(v);
        self.open.insert(v, 2);
    }

    /// Places `v` under the shallowest leaf of `heap`, or as the root if
    /// nothing is placed yet. `tie` orders `v` among leaves of equal rank.
    pub(crate) fn insert_by_rank(&mut self, heap: &mut BinaryHeap<RankedLeaf>, v: usize, tie: u64) {
        if self.placed[v] {
            return;
        }
        if self.order.is_empty() {
            self.place_root(v);
        } else if let Some(leaf) = heap.pop() {
            if leaf.free > 1 {
                heap.push(RankedLeaf {
                    free: leaf.free - 1,
                    ..leaf
                });
            }
            self.attach(v, leaf.vertex);
        } else {
            return;
        }
        heap.push(RankedLeaf {
            rank: self.rank[v],
            tie,
            vertex: v,
            free: 2,
        });
    }

    /// Attaches every unplaced vertex breadth-first under the shallowest
    /// open leaves, then checks the result.
    ///
    /// # Errors
    /// [`Error::Precondition`] for an empty vertex set,
    /// [`Error::InvariantViolation`] if the layout is not a valid tree.
    pub fn finish(mut self) -> Result<(f64, TreeLayout)> {
        let n = self.parents.len();
        if n == 0 {
            return Err(Error::Precondition("no vertices to place".into()));
        }

        let mut heap: BinaryHeap<RankedLeaf> = self
            .open
            .iter()
            .map(|(&vertex, &free)| RankedLeaf {
                rank: self.rank[vertex],
                tie: vertex as u64,
                vertex,
                free,
            })
            .collect();
        for v in 0..n {
            self.insert_by_rank(&mut heap, v, v as u64);
        }

        let layout = TreeLayout::from_parents(self.parents);
        if !layout.validate() {
            return Err(Error::InvariantViolation(format!(
                "greedy construction produced an invalid tree: {:?}",
                layout.parents()
            )));
        }
        Ok((self.cost, layout))
    }
}

/// Greedy tree from a demand matrix.
///
/// Pairs with positive symmetric demand are visited heaviest first (ties by
/// `(u, v)`), each endpoint inserted with [`GreedyBuilder::insert`]; when
/// neither endpoint is placed the first one is picked at random. Vertices
/// without demand are attached breadth-first at the end.
///
/// # Errors
/// [`Error::Precondition`] for an empty matrix,
/// [`Error::InvariantViolation`] if the result is not a valid tree.
#[instrument(level = "debug", skip_all, fields(n = demand.len()))]
pub fn greedy_build<R: Rng>(demand: &DemandMatrix, rng: &mut R) -> Result<(f64, TreeLayout)> {
    let n = demand.len();
    let mut pairs = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            let w = demand.symmetric(u, v);
            if w > 0.0 {
                pairs.push((w, u, v));
            }
        }
    }
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let pairs = pairs.into_iter().map(|(_, u, v)| (u, v));
    let (cost, layout) = build_in_order(demand, pairs, rng)?;
    debug!(cost, "greedy layout built");
    Ok((cost, layout))
}

/// Greedy tree driven by a query sequence, in the given order.
///
/// # Errors
/// [`Error::Precondition`] for `n == 0` or an out-of-range query.
#[instrument(level = "debug", skip_all, fields(n = n, queries = queries.len()))]
pub fn greedy_build_queries<R: Rng>(
    n: usize,
    queries: &[(usize, usize)],
    rng: &mut R,
) -> Result<(f64, TreeLayout)> {
    let demand = DemandMatrix::from_queries(n, queries)?;
    let (cost, layout) = build_in_order(&demand, queries.iter().copied(), rng)?;
    debug!(cost, "greedy layout built");
    Ok((cost, layout))
}

fn build_in_order<R: Rng>(
    demand: &DemandMatrix,
    pairs: impl IntoIterator<Item = (usize, usize)>,
    rng: &mut R,
) -> Result<(f64, TreeLayout)> {
    if demand.is_empty() {
        return Err(Error::Precondition("no vertices to place".into()));
    }

    let mut builder = GreedyBuilder::new(demand);
    for (mut src, mut dst) in pairs {
        if !builder.is_placed(src) && !builder.is_placed(dst) && rng.random_bool(0.5) {
            std::mem::swap(&mut src, &mut dst);
        }
        builder.insert(src);
        builder.insert(dst);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::tree::{cost, query_cost};

    fn random_demand(n: usize, density: f64, seed: u64) -> DemandMatrix {
        let mut rng = create_rng(seed);
        let mut demand = DemandMatrix::zeros(n);
        for u in 0..n {
            for v in 0..n {
                if u != v && rng.random_bool(density) {
                    demand.set(u, v, rng.random_range(1..50) as f64).unwrap();
                }
            }
        }
        demand
    }

    #[test]
    fn test_ranked_leaf_order() {
        let mut heap = BinaryHeap::from([
            RankedLeaf { rank: 2, tie: 0, vertex: 5, free: 2 },
            RankedLeaf { rank: 1, tie: 9, vertex: 3, free: 1 },
            RankedLeaf { rank: 1, tie: 4, vertex: 7, free: 2 },
        ]);
        assert_eq!(heap.pop().map(|l| l.vertex), Some(7));
        assert_eq!(heap.pop().map(|l| l.vertex), Some(3));
        assert_eq!(heap.pop().map(|l| l.vertex), Some(5));
    }

    #[test]
    fn test_insert_prefers_partner() {
        // 3 only talks to 2, which sits deeper than 1
        let demand = DemandMatrix::from_queries(4, &[(0, 1), (0, 2), (1, 2), (3, 2)]).unwrap();
        let mut builder = GreedyBuilder::new(&demand);
        for v in [0, 1, 2, 3] {
            builder.insert(v);
        }
        let (_, layout) = builder.finish().unwrap();
        assert_eq!(layout.parent(3), Some(2));
    }

    #[test]
    fn test_reinsert_is_noop() {
        let demand = DemandMatrix::from_queries(2, &[(0, 1)]).unwrap();
        let mut builder = GreedyBuilder::new(&demand);
        builder.insert(0);
        builder.insert(0);
        assert_eq!(builder.placed_count(), 1);
    }

    #[test]
    fn test_empty_is_precondition() {
        let mut rng = create_rng(0);
        let err = greedy_build(&DemandMatrix::zeros(0), &mut rng).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_zero_demand_gives_breadth_first_tree() {
        let mut rng = create_rng(1);
        let (c, layout) = greedy_build(&DemandMatrix::zeros(7), &mut rng).unwrap();
        assert_eq!(c, 0.0);
        assert!(layout.validate());
        assert_eq!(layout.height(), 3);
    }

    #[test]
    fn test_accumulated_cost_is_exact() {
        for seed in 0..20 {
            let n = 5 + seed as usize;
            let demand = random_demand(n, 0.3, seed);
            let mut rng = create_rng(seed);
            let (c, layout) = greedy_build(&demand, &mut rng).unwrap();
            assert!(layout.validate());
            let exact = cost(&layout, &demand).unwrap();
            assert!((c - exact).abs() < 1e-6, "seed {seed}: {c} vs {exact}");
        }
    }

    #[test]
    fn test_sparse_demand_leaves_isolated_vertices() {
        let demand = DemandMatrix::from_queries(10, &[(2, 7)]).unwrap();
        let mut rng = create_rng(2);
        let (c, layout) = greedy_build(&demand, &mut rng).unwrap();
        assert!(layout.validate());
        assert_eq!(c, 1.0);
    }

    #[test]
    fn test_queries_cost_matches_query_cost() {
        let queries = [(0, 5), (5, 2), (1, 3), (0, 5), (4, 4), (3, 2)];
        let mut rng = create_rng(3);
        let (c, layout) = greedy_build_queries(6, &queries, &mut rng).unwrap();
        assert!(layout.validate());
        assert_eq!(c, query_cost(&layout, &queries).unwrap() as f64);
    }

    #[test]
    fn test_queries_out_of_range() {
        let mut rng = create_rng(4);
        assert!(greedy_build_queries(3, &[(0, 3)], &mut rng).is_err());
    }
}
