//! Parent-pointer encoding of a rooted binary tree.

use super::demand::DemandMatrix;
use crate::error::{Error, Result};
use std::collections::VecDeque;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A predecessor mapping `vertex -> parent`, `None` marking the root.
///
/// A valid layout has exactly one root, no cycles, at most two children per
/// vertex and every vertex reachable from the root. Constructors may hold a
/// partial layout while building; [`validate`](TreeLayout::validate) is
/// checked once the layout is finalized.
///
/// # Examples
///
/// ```
/// use treelayout::tree::TreeLayout;
///
/// //     1
/// //    / \
/// //   0   2
/// let layout = TreeLayout::from_parents(vec![Some(1), None, Some(1)]);
/// assert!(layout.validate());
/// assert_eq!(layout.root(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeLayout {
    parents: Vec<Option<usize>>,
}

impl TreeLayout {
    /// Wraps a raw predecessor array without checking it.
    pub fn from_parents(parents: Vec<Option<usize>>) -> Self {
        Self { parents }
    }

    /// Wraps a raw predecessor array, rejecting invalid trees.
    pub fn try_from_parents(parents: Vec<Option<usize>>) -> Result<Self> {
        let layout = Self { parents };
        if layout.validate() {
            Ok(layout)
        } else {
            Err(Error::InvariantViolation(format!(
                "not a binary tree: {:?}",
                layout.parents
            )))
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True for the empty layout.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Parent of `v`, `None` for the root.
    #[inline]
    pub fn parent(&self, v: usize) -> Option<usize> {
        self.parents[v]
    }

    /// The raw predecessor array.
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// Consumes the layout, returning the predecessor array.
    pub fn into_parents(self) -> Vec<Option<usize>> {
        self.parents
    }

    /// The first vertex without a parent.
    pub fn root(&self) -> Option<usize> {
        self.parents.iter().position(Option::is_none)
    }

    /// Children of every vertex, in increasing vertex order.
    ///
    /// Out-of-range parents are ignored.
    pub fn children(&self) -> Vec<Vec<usize>> {
        let n = self.parents.len();
        let mut children = vec![Vec::new(); n];
        for (v, p) in self.parents.iter().enumerate() {
            if let Some(p) = *p {
                if p < n {
                    children[p].push(v);
                }
            }
        }
        children
    }

    /// Checks the binary-tree invariants.
    ///
    /// Root-first breadth-first traversal (a vertex seen twice means a cycle
    /// or a shared child, more than two children fails immediately) followed
    /// by a coverage pass.
    pub fn validate(&self) -> bool {
        let n = self.parents.len();
        if n == 0 {
            return false;
        }

        let mut root = None;
        for (v, p) in self.parents.iter().enumerate() {
            match p {
                None if root.is_some() => return false,
                None => root = Some(v),
                Some(p) if *p >= n || *p == v => return false,
                Some(_) => {}
            }
        }
        let Some(root) = root else {
            return false;
        };

        let children = self.children();
        let mut visited = vec![false; n];
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            if visited[v] || children[v].len() > 2 {
                return false;
            }
            visited[v] = true;
            queue.extend(children[v].iter().copied());
        }

        visited.into_iter().all(|seen| seen)
    }

    /// Breadth-first depth of every vertex from the root.
    ///
    /// Unreachable vertices get `u32::MAX`.
    pub fn depths(&self) -> Vec<u32> {
        let n = self.parents.len();
        let mut depth = vec![u32::MAX; n];
        let Some(root) = self.root() else {
            return depth;
        };
        let children = self.children();
        depth[root] = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            for &c in &children[v] {
                if depth[c] == u32::MAX {
                    depth[c] = depth[v] + 1;
                    queue.push_back(c);
                }
            }
        }
        depth
    }

    /// Number of levels (a single root has height 1).
    pub fn height(&self) -> usize {
        self.depths()
            .into_iter()
            .filter(|&d| d != u32::MAX)
            .max()
            .map_or(0, |d| d as usize + 1)
    }

    /// Undirected adjacency lists.
    fn adjacency(&self) -> Vec<Vec<usize>> {
        let n = self.parents.len();
        let mut adj = vec![Vec::with_capacity(3); n];
        for (v, p) in self.parents.iter().enumerate() {
            if let Some(p) = *p {
                adj[v].push(p);
                adj[p].push(v);
            }
        }
        adj
    }

    /// Hop distance between every pair of vertices.
    ///
    /// One breadth-first traversal per source over the undirected tree,
    /// O(n²) overall. Unreachable pairs get `u32::MAX`.
    pub fn all_pairs_distances(&self) -> Vec<Vec<u32>> {
        let adj = self.adjacency();
        (0..self.parents.len())
            .map(|src| bfs_distances(&adj, src))
            .collect()
    }

    /// [`all_pairs_distances`](Self::all_pairs_distances) with the
    /// per-source traversals spread over the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn par_all_pairs_distances(&self) -> Vec<Vec<u32>> {
        let adj = self.adjacency();
        (0..self.parents.len())
            .into_par_iter()
            .map(|src| bfs_distances(&adj, src))
            .collect()
    }
}

impl TryFrom<Vec<Option<usize>>> for TreeLayout {
    type Error = Error;

    fn try_from(parents: Vec<Option<usize>>) -> Result<Self> {
        Self::try_from_parents(parents)
    }
}

fn bfs_distances(adj: &[Vec<usize>], src: usize) -> Vec<u32> {
    let mut dist = vec![u32::MAX; adj.len()];
    dist[src] = 0;
    let mut queue = VecDeque::from([src]);
    while let Some(v) = queue.pop_front() {
        for &w in &adj[v] {
            if dist[w] == u32::MAX {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
        }
    }
    dist
}

/// Demand-weighted hop distance: `Σ_{u,v} dist(u, v) · demand(u, v)`.
///
/// # Errors
/// [`Error::Precondition`] when the sizes differ or the layout is not a
/// connected tree.
pub fn cost(layout: &TreeLayout, demand: &DemandMatrix) -> Result<f64> {
    cost_from_distances(layout, demand, &layout.all_pairs_distances())
}

/// [`cost`] with the distance rows computed in parallel.
#[cfg(feature = "parallel")]
pub fn par_cost(layout: &TreeLayout, demand: &DemandMatrix) -> Result<f64> {
    cost_from_distances(layout, demand, &layout.par_all_pairs_distances())
}

fn cost_from_distances(
    layout: &TreeLayout,
    demand: &DemandMatrix,
    distances: &[Vec<u32>],
) -> Result<f64> {
    let n = layout.len();
    if demand.len() != n {
        return Err(Error::Precondition(format!(
            "layout has {n} vertices, demand has {}",
            demand.len()
        )));
    }

    let mut total = 0.0;
    for (src, row) in distances.iter().enumerate() {
        let weights = demand.row(src);
        for (dst, &d) in row.iter().enumerate() {
            let w = weights[dst];
            if w == 0.0 {
                continue;
            }
            if d == u32::MAX {
                return Err(Error::Precondition(format!(
                    "vertices {src} and {dst} are disconnected"
                )));
            }
            total += d as f64 * w;
        }
    }
    Ok(total)
}

/// Number of hops summed over a multiset of `(src, dst)` queries.
pub fn query_cost(layout: &TreeLayout, queries: &[(usize, usize)]) -> Result<u64> {
    let n = layout.len();
    let distances = layout.all_pairs_distances();
    let mut total = 0u64;
    for &(src, dst) in queries {
        if src >= n || dst >= n {
            return Err(Error::Precondition(format!(
                "query ({src}, {dst}) out of range for {n} vertices"
            )));
        }
        let d = distances[src][dst];
        if d == u32::MAX {
            return Err(Error::Precondition(format!(
                "vertices {src} and {dst} are disconnected"
            )));
        }
        total += d as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> TreeLayout {
        TreeLayout::from_parents((0..n).map(|v| v.checked_sub(1)).collect())
    }

    #[test]
    fn test_valid_shapes() {
        assert!(TreeLayout::from_parents(vec![None]).validate());
        assert!(path(10).validate());
        assert!(TreeLayout::from_parents(vec![None, Some(0), Some(0), Some(1), Some(1)]).validate());
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(!TreeLayout::from_parents(vec![]).validate());
    }

    #[test]
    fn test_second_root_invalid() {
        let mut parents = path(5).into_parents();
        parents[3] = None;
        assert!(!TreeLayout::from_parents(parents).validate());
    }

    #[test]
    fn test_cycle_invalid() {
        // 0 is root, 1 -> 2 -> 3 -> 1 detached cycle
        let layout = TreeLayout::from_parents(vec![None, Some(3), Some(1), Some(2)]);
        assert!(!layout.validate());
        // self loop
        let layout = TreeLayout::from_parents(vec![None, Some(1)]);
        assert!(!layout.validate());
    }

    #[test]
    fn test_third_child_invalid() {
        let layout = TreeLayout::from_parents(vec![None, Some(0), Some(0), Some(0)]);
        assert!(!layout.validate());
    }

    #[test]
    fn test_out_of_range_parent_invalid() {
        let layout = TreeLayout::from_parents(vec![None, Some(7)]);
        assert!(!layout.validate());
        assert!(TreeLayout::try_from(vec![None, Some(7)]).is_err());
    }

    #[test]
    fn test_distances_on_path() {
        let d = path(4).all_pairs_distances();
        assert_eq!(d[0], vec![0, 1, 2, 3]);
        assert_eq!(d[3][1], 2);
    }

    #[test]
    fn test_depths_and_height() {
        let layout = TreeLayout::from_parents(vec![Some(1), None, Some(1), Some(2)]);
        assert_eq!(layout.depths(), vec![1, 0, 1, 2]);
        assert_eq!(layout.height(), 3);
    }

    #[test]
    fn test_cost_asymmetric() {
        let layout = path(3);
        let demand = DemandMatrix::from_triples(3, &[(0, 2, 2.0), (1, 0, 1.0)]).unwrap();
        // 2 hops * 2.0 + 1 hop * 1.0
        assert!((cost(&layout, &demand).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cost_size_mismatch() {
        let demand = DemandMatrix::zeros(4);
        assert!(cost(&path(3), &demand).is_err());
    }

    #[test]
    fn test_query_cost() {
        let layout = path(4);
        assert_eq!(query_cost(&layout, &[(0, 3), (3, 0), (1, 2)]).unwrap(), 7);
        assert!(query_cost(&layout, &[(0, 4)]).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_distances_match() {
        let layout = TreeLayout::from_parents(vec![None, Some(0), Some(0), Some(1), Some(2), Some(2)]);
        assert_eq!(layout.all_pairs_distances(), layout.par_all_pairs_distances());
    }
}
